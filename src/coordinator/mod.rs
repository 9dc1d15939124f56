mod lifecycle;
mod pending;

pub use lifecycle::{LifecycleEvent, LifecycleState};
pub use pending::PendingStore;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::agent::{PanelAgent, PanelHandle};
use crate::ai::{GeneratedSummary, SummaryClient, SummaryError};
use crate::error::{AppError, Result};
use crate::extract::{thumbnail_url, video_id_from_url, TextExtractor};
use crate::models::{
    AgentMessage, CollectedText, ContextId, CoordinatorRequest, PendingSummary,
    SavedSummaryRecord, SummaryMode,
};
use crate::services::SummaryPersister;

const UNTITLED: &str = "(untitled)";
pub const NOTHING_TO_SAVE: &str =
    "There is no new summary to save. Generate a summary of the video first.";

/// Lifecycle bookkeeping for one context.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot {
    pub state: LifecycleState,
    pub latest_seq: u64,
    pub pending: Option<PendingSummary>,
}

struct ContextEntry {
    state: LifecycleState,
    latest_seq: u64,
    video_url: String,
    save_in_flight: bool,
    agent: PanelHandle,
}

/// Cloneable front door to the coordinator task.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<CoordinatorRequest>,
}

impl CoordinatorHandle {
    /// Start a summary for `context`, activating its page agent if needed.
    pub async fn summarize(
        &self,
        context: ContextId,
        video_url: &str,
        mode: SummaryMode,
    ) -> Result<PanelHandle> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorRequest::Summarize {
            context,
            video_url: video_url.to_string(),
            mode,
            reply,
        })?;
        rx.await.map_err(|_| AppError::ChannelClosed)
    }

    pub fn close_context(&self, context: ContextId) -> Result<()> {
        self.send(CoordinatorRequest::CloseContext { context })
    }

    #[cfg(test)]
    pub async fn inspect(&self, context: ContextId) -> Result<Option<ContextSnapshot>> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorRequest::Inspect { context, reply })?;
        rx.await.map_err(|_| AppError::ChannelClosed)
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(CoordinatorRequest::Shutdown);
    }

    fn send(&self, request: CoordinatorRequest) -> Result<()> {
        self.tx
            .send(request)
            .map_err(|_| AppError::ChannelClosed)
    }
}

/// Owns the resolved-model cache (through the client), the pending store
/// and the saved list, and drives every context's lifecycle.
pub struct Coordinator {
    rx: mpsc::UnboundedReceiver<CoordinatorRequest>,
    tx: mpsc::UnboundedSender<CoordinatorRequest>,
    client: Arc<SummaryClient>,
    api_key: std::result::Result<String, SummaryError>,
    persister: Arc<SummaryPersister>,
    extractor: Arc<TextExtractor>,
    pending: PendingStore,
    contexts: HashMap<ContextId, ContextEntry>,
}

impl Coordinator {
    pub fn spawn(
        client: SummaryClient,
        api_key: std::result::Result<String, SummaryError>,
        persister: SummaryPersister,
        extractor: TextExtractor,
    ) -> (CoordinatorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            rx,
            tx: tx.clone(),
            client: Arc::new(client),
            api_key,
            persister: Arc::new(persister),
            extractor: Arc::new(extractor),
            pending: PendingStore::default(),
            contexts: HashMap::new(),
        };
        let task = tokio::spawn(coordinator.run());
        (CoordinatorHandle { tx }, task)
    }

    async fn run(mut self) {
        while let Some(request) = self.rx.recv().await {
            if matches!(request, CoordinatorRequest::Shutdown) {
                break;
            }
            self.handle(request);
        }
        self.persister.finish_mirrors().await;
        tracing::debug!("Coordinator stopped with {} pending summaries", self.pending.len());
    }

    fn handle(&mut self, request: CoordinatorRequest) {
        match request {
            CoordinatorRequest::Summarize {
                context,
                video_url,
                mode,
                reply,
            } => self.on_summarize(context, video_url, mode, reply),

            CoordinatorRequest::CollectedText {
                context,
                seq,
                payload,
            } => self.on_collected_text(context, seq, payload),

            CoordinatorRequest::GenerationFinished {
                context,
                seq,
                payload,
                result,
            } => self.on_generation_finished(context, seq, payload, result),

            CoordinatorRequest::SaveLastSummary { context } => self.on_save(context),

            CoordinatorRequest::SaveFinished {
                context,
                pending,
                result,
            } => self.on_save_finished(context, pending, result),

            CoordinatorRequest::Dismissed { context } => {
                if let Some(entry) = self.contexts.get_mut(&context) {
                    entry.state = entry.state.apply(LifecycleEvent::Dismissed);
                }
            }

            CoordinatorRequest::CloseContext { context } => {
                self.pending.discard(context);
                if self.contexts.remove(&context).is_some() {
                    tracing::debug!("Closed {}", context);
                }
            }

            #[cfg(test)]
            CoordinatorRequest::Inspect { context, reply } => {
                let snapshot = self.contexts.get(&context).map(|entry| ContextSnapshot {
                    state: entry.state,
                    latest_seq: entry.latest_seq,
                    pending: self.pending.get(context).cloned(),
                });
                let _ = reply.send(snapshot);
            }

            CoordinatorRequest::Shutdown => {}
        }
    }

    fn on_summarize(
        &mut self,
        context: ContextId,
        video_url: String,
        mode: SummaryMode,
        reply: oneshot::Sender<PanelHandle>,
    ) {
        let extractor = &self.extractor;
        let tx = &self.tx;
        let entry = self.contexts.entry(context).or_insert_with(|| ContextEntry {
            state: LifecycleState::Idle,
            latest_seq: 0,
            video_url: String::new(),
            save_in_flight: false,
            agent: PanelAgent::spawn(context, Arc::clone(extractor), tx.clone()),
        });

        entry.latest_seq += 1;
        entry.state = entry.state.apply(LifecycleEvent::Triggered);
        entry.video_url = video_url.clone();
        let seq = entry.latest_seq;
        let agent = entry.agent.clone();

        tracing::debug!("Summarize {} request {} ({})", context, seq, mode);

        if let Err(e) = agent.deliver(AgentMessage::Summarize {
            seq,
            video_url,
            mode,
        }) {
            tracing::warn!("Could not activate agent for {}: {}", context, e);
        }
        let _ = reply.send(agent);
    }

    fn on_collected_text(&mut self, context: ContextId, seq: u64, payload: CollectedText) {
        if !self.is_latest(context, seq) {
            return;
        }

        let api_key = match self.api_key.clone() {
            Ok(key) => key,
            Err(e) => {
                self.on_generation_finished(context, seq, payload, Err(e));
                return;
            }
        };

        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.generate(&payload.text, payload.mode, &api_key).await;
            let finished = CoordinatorRequest::GenerationFinished {
                context,
                seq,
                payload,
                result,
            };
            if tx.send(finished).is_err() {
                tracing::debug!("Coordinator gone before generation for {} finished", context);
            }
        });
    }

    fn on_generation_finished(
        &mut self,
        context: ContextId,
        seq: u64,
        payload: CollectedText,
        result: std::result::Result<GeneratedSummary, SummaryError>,
    ) {
        if !self.is_latest(context, seq) {
            return;
        }
        let Some(entry) = self.contexts.get_mut(&context) else {
            tracing::warn!("Generation finished for unknown {}", context);
            return;
        };

        let message = match result {
            Ok(generated) => {
                entry.state = entry.state.apply(LifecycleEvent::Succeeded);

                let video_id = payload
                    .video_id
                    .clone()
                    .or_else(|| video_id_from_url(&payload.video_url));
                let title = if payload.title.trim().is_empty() {
                    UNTITLED.to_string()
                } else {
                    payload.title.clone()
                };

                self.pending.put(PendingSummary {
                    context,
                    seq,
                    video_url: payload.video_url.clone(),
                    title,
                    thumbnail_url: video_id.as_deref().map(thumbnail_url),
                    summary: generated.summary.clone(),
                    provenance: payload.provenance,
                    mode: payload.mode,
                });

                tracing::info!(
                    "Summary generated for {} with model {}",
                    payload.video_url,
                    generated.model_used
                );

                AgentMessage::SummaryReady {
                    seq,
                    summary: generated.summary,
                    video_url: payload.video_url,
                    provenance: payload.provenance,
                    model_used: generated.model_used,
                }
            }
            Err(e) => {
                entry.state = entry.state.apply(LifecycleEvent::Failed);
                tracing::error!("Failed to generate summary for {}: {}", payload.video_url, e);

                AgentMessage::SummaryError {
                    seq: Some(seq),
                    error: e.to_string(),
                    video_url: payload.video_url,
                    provenance: Some(payload.provenance),
                }
            }
        };

        if let Err(e) = entry.agent.deliver(message) {
            tracing::warn!("Agent for {} unreachable: {}", context, e);
        }
    }

    fn on_save(&mut self, context: ContextId) {
        let Some(entry) = self.contexts.get_mut(&context) else {
            tracing::warn!("Save requested for unknown {}", context);
            return;
        };
        if entry.save_in_flight {
            tracing::debug!("Save already running for {}", context);
            return;
        }

        let Some(pending) = self.pending.get(context).cloned() else {
            let error = AgentMessage::SummaryError {
                seq: None,
                error: NOTHING_TO_SAVE.to_string(),
                video_url: entry.video_url.clone(),
                provenance: None,
            };
            if let Err(e) = entry.agent.deliver(error) {
                tracing::warn!("Agent for {} unreachable: {}", context, e);
            }
            return;
        };
        entry.save_in_flight = true;

        let persister = Arc::clone(&self.persister);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = persister.save(&pending).await;
            let finished = CoordinatorRequest::SaveFinished {
                context,
                pending,
                result,
            };
            if tx.send(finished).is_err() {
                tracing::debug!("Coordinator gone before save for {} finished", context);
            }
        });
    }

    fn on_save_finished(
        &mut self,
        context: ContextId,
        pending: PendingSummary,
        result: Result<SavedSummaryRecord>,
    ) {
        let Some(entry) = self.contexts.get_mut(&context) else {
            tracing::warn!("Save finished for closed {}", context);
            return;
        };
        entry.save_in_flight = false;

        let message = match result {
            Ok(record) => {
                // A newer summary may have arrived while the save ran.
                if self.pending.get(context).is_some_and(|p| p.seq == pending.seq) {
                    self.pending.take(context);
                }
                if pending.seq == entry.latest_seq {
                    entry.state = entry.state.apply(LifecycleEvent::Saved);
                }
                tracing::debug!("Pending summary for {} saved as {}", context, record.id);
                AgentMessage::SummarySaved {
                    seq: pending.seq,
                    video_url: pending.video_url,
                    provenance: pending.provenance,
                }
            }
            Err(e) => {
                tracing::error!("Failed to save summary for {}: {}", context, e);
                AgentMessage::SummaryError {
                    seq: None,
                    error: format!("Failed to save summary: {e}"),
                    video_url: pending.video_url,
                    provenance: Some(pending.provenance),
                }
            }
        };

        if let Err(e) = entry.agent.deliver(message) {
            tracing::warn!("Agent for {} unreachable: {}", context, e);
        }
    }

    fn is_latest(&self, context: ContextId, seq: u64) -> bool {
        match self.contexts.get(&context) {
            Some(entry) if entry.latest_seq == seq => true,
            Some(entry) => {
                tracing::debug!(
                    "Dropping stale response {} for {} (latest {})",
                    seq,
                    context,
                    entry.latest_seq
                );
                false
            }
            None => {
                tracing::debug!("Dropping response for closed {}", context);
                false
            }
        }
    }
}
