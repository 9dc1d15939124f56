use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::SummaryError;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
        }
    }

    #[cfg(test)]
    pub fn prompt_text(&self) -> String {
        self.contents
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelList {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "supportedGenerationMethods")]
    pub supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Status and body of a provider response, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `error.message` field of a JSON error body, if any.
    pub fn provider_message(&self) -> Option<String> {
        serde_json::from_str::<ErrorEnvelope>(&self.body)
            .ok()
            .and_then(|e| e.error)
            .and_then(|e| e.message)
            .filter(|m| !m.trim().is_empty())
    }

    /// Parsed error message, else the raw body, else the status text.
    pub fn best_message(&self) -> String {
        if let Some(message) = self.provider_message() {
            return message;
        }
        let body = self.body.trim();
        if !body.is_empty() {
            return body.to_string();
        }
        self.status_text.clone()
    }
}

/// The two provider endpoints the summary client consumes.
#[async_trait]
pub trait GenerationApi: Send + Sync {
    async fn list_models(&self, api_key: &str) -> Result<RawResponse, SummaryError>;

    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<RawResponse, SummaryError>;
}

pub struct GeminiHttp {
    client: Client,
    base_url: String,
}

impl GeminiHttp {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn into_raw(response: reqwest::Response) -> Result<RawResponse, SummaryError> {
        let status = response.status();
        let body = response.text().await?;
        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}

impl Default for GeminiHttp {
    fn default() -> Self {
        Self::new(GEMINI_API_BASE, Duration::from_secs(60))
    }
}

#[async_trait]
impl GenerationApi for GeminiHttp {
    async fn list_models(&self, api_key: &str) -> Result<RawResponse, SummaryError> {
        let url = format!(
            "{}/models?key={}",
            self.base_url,
            urlencoding::encode(api_key)
        );
        let response = self.client.get(url).send().await?;
        Self::into_raw(response).await
    }

    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<RawResponse, SummaryError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            urlencoding::encode(model),
            urlencoding::encode(api_key)
        );
        let response = self.client.post(url).json(request).send().await?;
        Self::into_raw(response).await
    }
}
