use std::sync::Arc;

use tokio::sync::Mutex;

use super::gemini::{GenerateContentResponse, ModelList};
use super::{build_prompt, GenerateContentRequest, GenerationApi, RawResponse, SummaryError};
use crate::models::SummaryMode;

/// Known-good models, best first.
pub const PREFERRED_MODELS: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-flash-002",
    "gemini-1.5-flash-latest",
    "gemini-2.0-flash-lite",
];

const MODEL_FAMILY_MARKER: &str = "flash";
const QUOTA_FALLBACK_DETAIL: &str = "You have exceeded the Gemini API quota for this model.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSummary {
    pub summary: String,
    pub model_used: String,
}

/// Pick a model from the generation-capable candidates.
pub fn select_model(candidates: &[String]) -> Option<String> {
    PREFERRED_MODELS
        .iter()
        .find(|p| candidates.iter().any(|c| c.as_str() == **p))
        .map(|p| p.to_string())
        .or_else(|| {
            candidates
                .iter()
                .find(|c| c.contains(MODEL_FAMILY_MARKER))
                .cloned()
        })
        .or_else(|| candidates.first().cloned())
}

pub struct SummaryClient {
    api: Arc<dyn GenerationApi>,
    // Model believed usable for the configured key. Cleared on 404.
    resolved_model: Mutex<Option<String>>,
}

impl SummaryClient {
    pub fn new(api: Arc<dyn GenerationApi>) -> Self {
        Self {
            api,
            resolved_model: Mutex::new(None),
        }
    }

    #[cfg(test)]
    pub async fn cached_model(&self) -> Option<String> {
        self.resolved_model.lock().await.clone()
    }

    /// Return the cached model, or list models and cache the best candidate.
    pub async fn resolve_model(&self, api_key: &str) -> Result<String, SummaryError> {
        let mut cached = self.resolved_model.lock().await;

        if let Some(model) = cached.as_ref() {
            return Ok(model.clone());
        }

        let response = self.api.list_models(api_key).await?;
        if !response.is_success() {
            return Err(failure_for(&response));
        }

        let list: ModelList = serde_json::from_str(&response.body)
            .map_err(|e| SummaryError::InvalidResponse(e.to_string()))?;

        let candidates: Vec<String> = list
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .filter(|name| !name.is_empty())
            .collect();

        let model = select_model(&candidates).ok_or(SummaryError::NoUsableModel)?;
        tracing::debug!("Resolved generation model {} from {} candidates", model, candidates.len());

        *cached = Some(model.clone());
        Ok(model)
    }

    pub async fn invalidate_model(&self) {
        *self.resolved_model.lock().await = None;
    }

    /// Summarize `text` in the given mode. Empty input is rejected before any
    /// request is made.
    pub async fn generate(
        &self,
        text: &str,
        mode: SummaryMode,
        api_key: &str,
    ) -> Result<GeneratedSummary, SummaryError> {
        if text.trim().is_empty() {
            return Err(SummaryError::EmptyInput);
        }

        let model = self.resolve_model(api_key).await?;

        let prompt = build_prompt(text, mode);
        if prompt.truncated {
            tracing::debug!("Source text truncated before generation");
        }
        let request = GenerateContentRequest::from_prompt(prompt.text);

        let response = self.api.generate_content(api_key, &model, &request).await?;

        if !response.is_success() {
            if response.status == 404 {
                tracing::warn!("Model {} reported missing, clearing cached model", model);
                self.invalidate_model().await;
                return Err(SummaryError::ModelUnavailable {
                    model,
                    message: response.best_message(),
                });
            }
            return Err(failure_for(&response));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&response.body)
            .map_err(|e| SummaryError::InvalidResponse(e.to_string()))?;

        let summary = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
            .trim()
            .to_string();

        if summary.is_empty() {
            return Err(SummaryError::EmptyResult);
        }

        Ok(GeneratedSummary {
            summary,
            model_used: model,
        })
    }
}

fn failure_for(response: &RawResponse) -> SummaryError {
    if response.status == 429 {
        return SummaryError::QuotaExceeded {
            detail: response
                .provider_message()
                .unwrap_or_else(|| QUOTA_FALLBACK_DETAIL.to_string()),
        };
    }
    SummaryError::ProviderError {
        status: response.status,
        message: response.best_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::{instruction, TRUNCATION_NOTICE};
    use crate::testing::{ok_summary, FakeGenerationApi};

    fn client(api: &Arc<FakeGenerationApi>) -> SummaryClient {
        SummaryClient::new(api.clone())
    }

    #[test]
    fn selection_prefers_known_models_then_family_then_first() {
        fn c(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }

        assert_eq!(
            select_model(&c(&["gemini-1.5-flash", "gemini-2.5-flash"])).as_deref(),
            Some("gemini-2.5-flash")
        );
        assert_eq!(
            select_model(&c(&["gemini-pro", "gemini-9-flash-exp"])).as_deref(),
            Some("gemini-9-flash-exp")
        );
        assert_eq!(
            select_model(&c(&["gemini-pro", "gemini-ultra"])).as_deref(),
            Some("gemini-pro")
        );
        assert_eq!(select_model(&[]), None);
    }

    #[tokio::test]
    async fn resolve_filters_by_generate_support_and_strips_prefix() {
        let api = Arc::new(FakeGenerationApi::with_models(&[
            ("models/embedding-001", "embedContent"),
            ("models/gemini-2.0-flash", "generateContent,countTokens"),
        ]));
        let model = client(&api).resolve_model("key").await.unwrap();
        assert_eq!(model, "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn resolve_fails_without_generation_models() {
        let api = Arc::new(FakeGenerationApi::with_models(&[(
            "models/embedding-001",
            "embedContent",
        )]));
        let err = client(&api).resolve_model("key").await.unwrap_err();
        assert_eq!(err, SummaryError::NoUsableModel);
    }

    #[tokio::test]
    async fn resolution_is_cached() {
        let api = Arc::new(FakeGenerationApi::default());
        let client = client(&api);

        client.resolve_model("key").await.unwrap();
        client.resolve_model("key").await.unwrap();
        client.resolve_model("key").await.unwrap();

        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test]
    async fn short_mode_scenario() {
        let api = Arc::new(FakeGenerationApi::default());
        api.push_generate(ok_summary("A short greeting."));

        let result = client(&api)
            .generate("Hello world", SummaryMode::Short, "key")
            .await
            .unwrap();

        assert_eq!(result.summary, "A short greeting.");
        assert_eq!(result.model_used, "gemini-2.5-flash");

        let prompts = api.prompts();
        assert_eq!(
            prompts[0],
            format!("{}\n\n---\n\nHello world", instruction(SummaryMode::Short))
        );
        assert!(!prompts[0].contains(TRUNCATION_NOTICE));
    }

    #[tokio::test]
    async fn fragments_are_concatenated_and_trimmed() {
        let api = Arc::new(FakeGenerationApi::default());
        api.push_generate(RawResponse {
            status: 200,
            status_text: "OK".to_string(),
            body: r#"{"candidates":[{"content":{"parts":[{"text":"  One "},{"text":"two.  "}]}},{"content":{"parts":[{"text":"ignored"}]}}]}"#
                .to_string(),
        });

        let result = client(&api)
            .generate("text", SummaryMode::All, "key")
            .await
            .unwrap();
        assert_eq!(result.summary, "One two.");
    }

    #[tokio::test]
    async fn empty_candidates_are_an_empty_result() {
        let api = Arc::new(FakeGenerationApi::default());
        api.push_generate(ok_summary("   "));

        let err = client(&api)
            .generate("text", SummaryMode::All, "key")
            .await
            .unwrap_err();
        assert_eq!(err, SummaryError::EmptyResult);
    }

    #[tokio::test]
    async fn empty_input_makes_no_requests() {
        let api = Arc::new(FakeGenerationApi::default());
        let err = client(&api)
            .generate("  \n ", SummaryMode::All, "key")
            .await
            .unwrap_err();

        assert_eq!(err, SummaryError::EmptyInput);
        assert_eq!(api.list_calls(), 0);
        assert!(api.prompts().is_empty());
    }

    #[tokio::test]
    async fn quota_error_carries_provider_detail() {
        let api = Arc::new(FakeGenerationApi::default());
        api.push_generate(RawResponse {
            status: 429,
            status_text: "Too Many Requests".to_string(),
            body: r#"{"error":{"message":"Quota exceeded"}}"#.to_string(),
        });

        let err = client(&api)
            .generate("text", SummaryMode::All, "key")
            .await
            .unwrap_err();

        assert!(matches!(err, SummaryError::QuotaExceeded { .. }));
        assert!(err.to_string().contains("Quota exceeded"));
    }

    #[tokio::test]
    async fn not_found_clears_cached_model() {
        let api = Arc::new(FakeGenerationApi::default());
        api.push_generate(RawResponse {
            status: 404,
            status_text: "Not Found".to_string(),
            body: r#"{"error":{"message":"models/gemini-2.5-flash is not found"}}"#.to_string(),
        });
        let client = client(&api);

        let err = client
            .generate("text", SummaryMode::All, "key")
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::ModelUnavailable { .. }));
        assert_eq!(client.cached_model().await, None);

        client.resolve_model("key").await.unwrap();
        assert_eq!(api.list_calls(), 2);
    }

    #[tokio::test]
    async fn other_failures_report_status_and_message() {
        let api = Arc::new(FakeGenerationApi::default());
        api.push_generate(RawResponse {
            status: 500,
            status_text: "Internal Server Error".to_string(),
            body: String::new(),
        });

        let err = client(&api)
            .generate("text", SummaryMode::All, "key")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SummaryError::ProviderError {
                status: 500,
                message: "Internal Server Error".to_string()
            }
        );
        // A generic failure keeps the cached model.
        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test]
    async fn listing_failure_is_surfaced() {
        let api = Arc::new(FakeGenerationApi::default());
        api.set_list_response(RawResponse {
            status: 403,
            status_text: "Forbidden".to_string(),
            body: r#"{"error":{"message":"API key not valid"}}"#.to_string(),
        });

        let err = client(&api).resolve_model("key").await.unwrap_err();
        assert_eq!(
            err,
            SummaryError::ProviderError {
                status: 403,
                message: "API key not valid".to_string()
            }
        );
    }
}
