use tokio::sync::oneshot;

use crate::agent::PanelHandle;
use crate::ai::{GeneratedSummary, SummaryError};
#[cfg(test)]
use crate::coordinator::ContextSnapshot;
use crate::error::Result;

use super::{ContextId, PendingSummary, Provenance, SavedSummaryRecord, SummaryMode};

/// Text gathered by a page agent, ready for generation.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedText {
    pub provenance: Provenance,
    pub text: String,
    pub video_url: String,
    pub title: String,
    pub video_id: Option<String>,
    pub mode: SummaryMode,
}

/// Messages delivered to a page agent, either relayed by the coordinator or
/// raised by the user on the panel itself.
#[derive(Debug, Clone)]
pub enum AgentMessage {
    Summarize {
        seq: u64,
        video_url: String,
        mode: SummaryMode,
    },
    SummaryReady {
        seq: u64,
        summary: String,
        video_url: String,
        provenance: Provenance,
        model_used: String,
    },
    /// `seq` is absent for errors not tied to a generation request.
    SummaryError {
        seq: Option<u64>,
        error: String,
        video_url: String,
        provenance: Option<Provenance>,
    },
    SummarySaved {
        seq: u64,
        video_url: String,
        provenance: Provenance,
    },
    SaveClicked,
    DismissClicked,
}

/// Everything the coordinator reacts to.
#[derive(Debug)]
pub enum CoordinatorRequest {
    /// User picked a summary mode on a tab.
    Summarize {
        context: ContextId,
        video_url: String,
        mode: SummaryMode,
        reply: oneshot::Sender<PanelHandle>,
    },
    CollectedText {
        context: ContextId,
        seq: u64,
        payload: CollectedText,
    },
    SaveLastSummary {
        context: ContextId,
    },
    Dismissed {
        context: ContextId,
    },
    /// The tab went away; pending state is discarded.
    CloseContext {
        context: ContextId,
    },
    #[cfg(test)]
    Inspect {
        context: ContextId,
        reply: oneshot::Sender<Option<ContextSnapshot>>,
    },
    GenerationFinished {
        context: ContextId,
        seq: u64,
        payload: CollectedText,
        result: std::result::Result<GeneratedSummary, SummaryError>,
    },
    /// A save started by `SaveLastSummary` completed.
    SaveFinished {
        context: ContextId,
        pending: PendingSummary,
        result: Result<SavedSummaryRecord>,
    },
    Shutdown,
}
