//! Test doubles for the network seams.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::agent::{PanelHandle, PanelView};
use crate::ai::{GenerateContentRequest, GenerationApi, RawResponse, SummaryError};
use crate::error::{AppError, Result};
use crate::extract::{PageContext, PageSource};

pub fn ok_summary(text: &str) -> RawResponse {
    RawResponse {
        status: 200,
        status_text: "OK".to_string(),
        body: serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
        .to_string(),
    }
}

/// Scripted generation provider. Generate responses are served in order;
/// once the queue is empty every call succeeds with "Summary.".
pub struct FakeGenerationApi {
    list_response: Mutex<RawResponse>,
    generate_responses: Mutex<VecDeque<(Duration, RawResponse)>>,
    list_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl Default for FakeGenerationApi {
    fn default() -> Self {
        Self::with_models(&[
            ("models/gemini-1.5-flash", "generateContent"),
            ("models/gemini-2.5-flash", "generateContent,countTokens"),
        ])
    }
}

impl FakeGenerationApi {
    /// `methods` is a comma separated list of supported generation methods.
    pub fn with_models(models: &[(&str, &str)]) -> Self {
        let models: Vec<_> = models
            .iter()
            .map(|(name, methods)| {
                let methods: Vec<&str> = methods.split(',').collect();
                serde_json::json!({ "name": name, "supportedGenerationMethods": methods })
            })
            .collect();
        Self {
            list_response: Mutex::new(RawResponse {
                status: 200,
                status_text: "OK".to_string(),
                body: serde_json::json!({ "models": models }).to_string(),
            }),
            generate_responses: Mutex::new(VecDeque::new()),
            list_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn set_list_response(&self, response: RawResponse) {
        *self.list_response.lock().unwrap() = response;
    }

    pub fn push_generate(&self, response: RawResponse) {
        self.push_delayed(Duration::ZERO, response);
    }

    pub fn push_delayed(&self, delay: Duration, response: RawResponse) {
        self.generate_responses
            .lock()
            .unwrap()
            .push_back((delay, response));
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationApi for FakeGenerationApi {
    async fn list_models(&self, _api_key: &str) -> std::result::Result<RawResponse, SummaryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.list_response.lock().unwrap().clone())
    }

    async fn generate_content(
        &self,
        _api_key: &str,
        _model: &str,
        request: &GenerateContentRequest,
    ) -> std::result::Result<RawResponse, SummaryError> {
        self.prompts.lock().unwrap().push(request.prompt_text());
        let next = self.generate_responses.lock().unwrap().pop_front();
        let (delay, response) = next.unwrap_or_else(|| (Duration::ZERO, ok_summary("Summary.")));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(response)
    }
}

/// In-memory pages and caption tracks keyed by URL.
#[derive(Default)]
pub struct FakePageSource {
    pages: HashMap<String, String>,
    captions: HashMap<String, String>,
}

impl FakePageSource {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_captions(mut self, url: &str, body: &str) -> Self {
        self.captions.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl PageSource for FakePageSource {
    async fn load_page(&self, url: &str) -> Result<PageContext> {
        self.pages
            .get(url)
            .map(|html| PageContext::from_html(url, html.clone()))
            .ok_or_else(|| AppError::Other(anyhow::anyhow!("no page at {url}")))
    }

    async fn fetch_caption_track(&self, url: &str) -> Result<String> {
        self.captions
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::Other(anyhow::anyhow!("no captions at {url}")))
    }
}

/// Wait (up to two seconds) until the panel satisfies `check`.
pub async fn wait_for_view(handle: &PanelHandle, check: impl Fn(&PanelView) -> bool) -> PanelView {
    let mut rx = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let view = rx.borrow_and_update().clone();
            if check(&view) {
                return view;
            }
            rx.changed().await.expect("panel agent stopped");
        }
    })
    .await
    .expect("panel never reached the expected state")
}
