use std::sync::Arc;

use super::{caption_text, find_player_response, video_id_from_url, with_json3_format};
use super::{PageContext, PageSource, PlayerResponse};
use crate::models::Provenance;

const UNKNOWN_VIDEO_TITLE: &str = "YouTube video";

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    pub provenance: Provenance,
    pub text: String,
    pub title: String,
    pub video_id: Option<String>,
}

/// Produces the best available source text for a video page.
pub struct TextExtractor {
    source: Arc<dyn PageSource>,
}

impl TextExtractor {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self { source }
    }

    /// Captions when the page has them, page metadata otherwise. Never fails.
    pub async fn collect(&self, video_url: &str) -> ExtractedText {
        let page = match self.source.load_page(video_url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::debug!("Failed to load {}: {}", video_url, e);
                PageContext::bare(video_url)
            }
        };
        let video_id = video_id_from_url(video_url);

        let Some(player) = page.html.as_deref().and_then(find_player_response) else {
            let title = page
                .document_title
                .clone()
                .unwrap_or_else(|| UNKNOWN_VIDEO_TITLE.to_string());
            let text = metadata_text(None, &page);
            return ExtractedText {
                provenance: Provenance::Metadata,
                text: if text.is_empty() { title.clone() } else { text },
                title,
                video_id,
            };
        };

        let title = player
            .title()
            .map(str::to_string)
            .or_else(|| page.document_title.clone())
            .unwrap_or_default();

        let captions = self.caption_text(&player).await;
        if !captions.is_empty() {
            return ExtractedText {
                provenance: Provenance::Captions,
                text: captions,
                title,
                video_id,
            };
        }

        ExtractedText {
            provenance: Provenance::Metadata,
            text: metadata_text(Some(&player), &page),
            title,
            video_id,
        }
    }

    /// Empty when the page has no caption track or fetching it fails.
    async fn caption_text(&self, player: &PlayerResponse) -> String {
        let Some(base_url) = player.first_caption_url() else {
            return String::new();
        };
        let url = with_json3_format(base_url);

        let body = match self.source.fetch_caption_track(&url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Caption fetch failed: {}", e);
                return String::new();
            }
        };

        caption_text(&body).unwrap_or_else(|e| {
            tracing::warn!("Caption track unreadable: {}", e);
            String::new()
        })
    }
}

fn metadata_text(player: Option<&PlayerResponse>, page: &PageContext) -> String {
    let mut parts = Vec::new();

    let title = player
        .and_then(|p| p.title())
        .or(page.document_title.as_deref());
    if let Some(title) = title {
        parts.push(format!("Title: {title}"));
    }

    if let Some(author) = player.and_then(|p| p.author()) {
        parts.push(format!("Author: {author}"));
    }

    if let Some(length) = player.and_then(|p| p.length_seconds()) {
        parts.push(format!("Length (s): {length}"));
    }

    let description = player
        .and_then(|p| p.description())
        .or(page.meta_description.as_deref());
    if let Some(description) = description {
        parts.push("Description:".to_string());
        parts.push(description.to_string());
    }

    if !page.url.is_empty() {
        parts.push(format!("URL: {}", page.url));
    }

    parts.join("\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePageSource;

    const URL: &str = "https://www.youtube.com/watch?v=abc123";

    fn page_with_player(player_json: &str) -> String {
        format!(
            "<html><head><title>Fallback title - YouTube</title></head><body><script>var ytInitialPlayerResponse = {player_json};</script></body></html>"
        )
    }

    #[tokio::test]
    async fn prefers_captions() {
        let source = FakePageSource::default()
            .with_page(
                URL,
                &page_with_player(
                    r#"{"videoDetails":{"title":"Talk"},"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://yt.test/tt?lang=en"}]}}}"#,
                ),
            )
            .with_captions(
                "https://yt.test/tt?lang=en&fmt=json3",
                r#"{"events":[{"segs":[{"utf8":"first"},{"utf8":"second"}]}]}"#,
            );
        let extractor = TextExtractor::new(Arc::new(source));

        let extracted = extractor.collect(URL).await;
        assert_eq!(extracted.provenance, Provenance::Captions);
        assert_eq!(extracted.text, "first second");
        assert_eq!(extracted.title, "Talk");
        assert_eq!(extracted.video_id.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn falls_back_to_metadata_when_captions_fail() {
        let source = FakePageSource::default().with_page(
            URL,
            &page_with_player(
                r#"{"videoDetails":{"title":"Talk","author":"Ann","lengthSeconds":"61","shortDescription":"About things."},"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://yt.test/missing"}]}}}"#,
            ),
        );
        let extractor = TextExtractor::new(Arc::new(source));

        let extracted = extractor.collect(URL).await;
        assert_eq!(extracted.provenance, Provenance::Metadata);
        assert_eq!(
            extracted.text,
            format!("Title: Talk\n\nAuthor: Ann\n\nLength (s): 61\n\nDescription:\n\nAbout things.\n\nURL: {URL}")
        );
    }

    #[tokio::test]
    async fn page_without_player_uses_document_metadata() {
        let source = FakePageSource::default().with_page(
            URL,
            r#"<html><head><title>Plain page</title><meta name="description" content="Just a page"></head></html>"#,
        );
        let extractor = TextExtractor::new(Arc::new(source));

        let extracted = extractor.collect(URL).await;
        assert_eq!(extracted.provenance, Provenance::Metadata);
        assert_eq!(extracted.title, "Plain page");
        assert!(extracted.text.starts_with("Title: Plain page"));
        assert!(extracted.text.contains("Just a page"));
    }

    #[test]
    fn unreachable_page_still_produces_text() {
        let extractor = TextExtractor::new(Arc::new(FakePageSource::default()));

        let extracted = tokio_test::block_on(extractor.collect(URL));
        assert_eq!(extracted.provenance, Provenance::Metadata);
        assert_eq!(extracted.title, "YouTube video");
        assert_eq!(extracted.text, format!("URL: {URL}"));
    }
}
