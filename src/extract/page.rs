use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;

use crate::error::{AppError, Result};

const USER_AGENT_STRING: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// What a page agent can see of its page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContext {
    pub url: String,
    pub html: Option<String>,
    pub document_title: Option<String>,
    pub meta_description: Option<String>,
}

impl PageContext {
    /// A page we could not load; only the URL is known.
    pub fn bare(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn from_html(url: &str, html: String) -> Self {
        let document_title = first_capture(title_re(), &html);
        let meta_description = first_capture(meta_description_re(), &html);
        Self {
            url: url.to_string(),
            html: Some(html),
            document_title,
            meta_description,
        }
    }
}

fn title_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok())
        .as_ref()
}

fn meta_description_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<meta[^>]*name=["']description["'][^>]*content=["']([^"']*)["']"#).ok()
    })
    .as_ref()
}

fn first_capture(re: Option<&Regex>, html: &str) -> Option<String> {
    re?.captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|s| !s.is_empty())
}

/// Decode named and numeric entities by rendering the fragment as text.
fn decode_entities(fragment: &str) -> String {
    // Wide enough that html2text never wraps inside a word.
    let width = fragment.len() + 2;
    match html2text::from_read(fragment.as_bytes(), width) {
        Ok(text) => text.split_whitespace().collect::<Vec<_>>().join(" "),
        Err(e) => {
            tracing::debug!("Could not decode page text: {}", e);
            fragment.to_string()
        }
    }
}

/// Network access available to a page agent.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn load_page(&self, url: &str) -> Result<PageContext>;

    /// Raw body of a caption track.
    async fn fetch_caption_track(&self, url: &str) -> Result<String>;
}

pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

impl Default for HttpPageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn load_page(&self, url: &str) -> Result<PageContext> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Other(anyhow::anyhow!(
                "Failed to load page: HTTP {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        Ok(PageContext::from_html(url, html))
    }

    async fn fetch_caption_track(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Other(anyhow::anyhow!(
                "Failed to fetch captions: HTTP {}",
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_title_and_description_from_html() {
        let html = r#"<html><head><title>Rust &amp; You - YouTube</title>
<meta name="description" content="A talk about ownership."></head></html>"#;
        let page = PageContext::from_html("https://www.youtube.com/watch?v=x", html.to_string());

        assert_eq!(page.document_title.as_deref(), Some("Rust & You - YouTube"));
        assert_eq!(page.meta_description.as_deref(), Some("A talk about ownership."));
    }

    #[test]
    fn decodes_numeric_entities() {
        let html = r#"<html><head><title>It&#x27;s Rust&#8217;s &quot;year&quot;</title>
<meta name="description" content="Tips &amp; tricks &#8212; part 2"></head></html>"#;
        let page = PageContext::from_html("https://www.youtube.com/watch?v=x", html.to_string());

        assert_eq!(page.document_title.as_deref(), Some("It's Rust\u{2019}s \"year\""));
        assert_eq!(page.meta_description.as_deref(), Some("Tips & tricks \u{2014} part 2"));
    }

    #[test]
    fn missing_tags_are_none() {
        let page = PageContext::from_html("https://example.com", "<html></html>".to_string());
        assert_eq!(page.document_title, None);
        assert_eq!(page.meta_description, None);
    }
}
