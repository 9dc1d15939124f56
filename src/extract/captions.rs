use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedEvent {
    #[serde(default)]
    segs: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    utf8: Option<String>,
}

/// Ask for the structured JSON caption format unless a format is already set.
pub fn with_json3_format(base_url: &str) -> String {
    let has_format = base_url
        .split(['?', '&'])
        .skip(1)
        .any(|pair| pair.starts_with("fmt="));
    if has_format {
        return base_url.to_string();
    }
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}fmt=json3")
}

/// Join the timed segments of a json3 caption track with single spaces.
pub fn caption_text(body: &str) -> crate::error::Result<String> {
    let timed: TimedText = serde_json::from_str(body)?;

    let text = timed
        .events
        .iter()
        .flat_map(|event| event.segs.iter())
        .filter_map(|seg| seg.utf8.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(text.trim().to_string())
}
