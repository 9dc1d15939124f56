use std::time::Duration;

use reqwest::Client;

use crate::config::RemoteMirrorConfig;
use crate::error::{AppError, Result};
use crate::models::SavedSummaryRecord;

/// Copies saved summaries to a user supplied HTTP endpoint.
pub struct RemoteMirror {
    client: Client,
    endpoint_url: String,
    api_key: Option<String>,
}

impl RemoteMirror {
    /// `None` unless the mirror is enabled and has an endpoint.
    pub fn from_config(config: &RemoteMirrorConfig) -> Option<Self> {
        if !config.is_active() {
            return None;
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Some(Self {
            client,
            endpoint_url: config.url.trim().to_string(),
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub async fn push(&self, record: &SavedSummaryRecord) -> Result<()> {
        let mut request = self.client.post(&self.endpoint_url).json(record);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let detail = if error_text.trim().is_empty() {
                status.canonical_reason().unwrap_or("").to_string()
            } else {
                error_text
            };
            return Err(AppError::Mirror(format!(
                "Remote DB response {}: {}",
                status.as_u16(),
                detail
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_config_builds_no_mirror() {
        let disabled = RemoteMirrorConfig {
            enabled: false,
            url: "https://db.example.com/summaries".to_string(),
            api_key: None,
        };
        assert!(RemoteMirror::from_config(&disabled).is_none());

        let no_url = RemoteMirrorConfig {
            enabled: true,
            url: "   ".to_string(),
            api_key: None,
        };
        assert!(RemoteMirror::from_config(&no_url).is_none());
    }

    #[test]
    fn active_config_trims_its_fields() {
        let config = RemoteMirrorConfig {
            enabled: true,
            url: " https://db.example.com/summaries ".to_string(),
            api_key: Some("  ".to_string()),
        };
        let mirror = RemoteMirror::from_config(&config).unwrap();
        assert_eq!(mirror.endpoint_url(), "https://db.example.com/summaries");
        assert!(mirror.api_key.is_none());
    }
}
