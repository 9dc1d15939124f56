mod error;
mod gemini;
mod prompt;
mod summarizer;

pub use error::SummaryError;
pub use gemini::{GeminiHttp, GenerateContentRequest, GenerationApi, RawResponse, GEMINI_API_BASE};
pub use prompt::build_prompt;
pub use summarizer::{GeneratedSummary, SummaryClient};
