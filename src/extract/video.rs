use url::Url;

const THUMBNAIL_TEMPLATE_HOST: &str = "https://i.ytimg.com/vi";

pub fn video_id_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let host = url.host_str()?;

    if host == "youtu.be" {
        return url
            .path()
            .trim_start_matches('/')
            .split('/')
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string);
    }

    if host == "youtube.com" || host.ends_with(".youtube.com") {
        if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
            if !v.is_empty() {
                return Some(v.into_owned());
            }
        }
        return url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|id| !id.is_empty())
            .map(str::to_string);
    }

    None
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("{THUMBNAIL_TEMPLATE_HOST}/{video_id}/hqdefault.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_ids_from_common_url_shapes() {
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            video_id_from_url("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            video_id_from_url("https://m.youtube.com/shorts/abc123").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn other_hosts_and_garbage_have_no_id() {
        assert_eq!(video_id_from_url("https://vimeo.com/12345"), None);
        assert_eq!(video_id_from_url("not a url"), None);
        assert_eq!(video_id_from_url("https://www.youtube.com/"), None);
    }

    #[test]
    fn thumbnail_follows_the_image_host_template() {
        assert_eq!(thumbnail_url("abc"), "https://i.ytimg.com/vi/abc/hqdefault.jpg");
    }
}
