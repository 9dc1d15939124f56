use thiserror::Error;

/// Failures of a single generation request. The display text is what the
/// user sees in the panel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryError {
    #[error("Gemini API key is not set. Add gemini_api_key to the config file.")]
    ConfigMissing,

    #[error("No model with generateContent support is available for this API key.")]
    NoUsableModel,

    #[error("Gemini model {model} is no longer available (404): {message}. The next request will pick another model.")]
    ModelUnavailable { model: String, message: String },

    #[error("Gemini API quota exceeded.\n\n{detail}\n\nCheck your plan and billing at https://ai.google.dev/gemini-api/docs/rate-limits.")]
    QuotaExceeded { detail: String },

    #[error("Gemini API returned error {status}: {message}")]
    ProviderError { status: u16, message: String },

    #[error("Gemini API returned no summary text.")]
    EmptyResult,

    #[error("Text to summarize is empty.")]
    EmptyInput,

    #[error("Request to Gemini failed: {0}")]
    Transport(String),

    #[error("Unexpected response from Gemini: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for SummaryError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
