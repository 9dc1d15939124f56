use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::view::DEFAULT_ERROR_TEXT;
use super::{PanelBody, PanelView};
use crate::error::{AppError, Result};
use crate::extract::TextExtractor;
use crate::models::{AgentMessage, CollectedText, ContextId, CoordinatorRequest, Provenance};

/// Cloneable access to a running page agent.
#[derive(Debug, Clone)]
pub struct PanelHandle {
    pub context: ContextId,
    commands: mpsc::UnboundedSender<AgentMessage>,
    view: watch::Receiver<PanelView>,
}

impl PanelHandle {
    pub fn view(&self) -> PanelView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelView> {
        self.view.clone()
    }

    /// The user pressed save on the panel.
    pub fn save(&self) -> Result<()> {
        self.deliver(AgentMessage::SaveClicked)
    }

    /// The user closed the panel.
    pub fn dismiss(&self) -> Result<()> {
        self.deliver(AgentMessage::DismissClicked)
    }

    /// Never waits, so the coordinator cannot stall on a busy agent.
    pub(crate) fn deliver(&self, message: AgentMessage) -> Result<()> {
        self.commands
            .send(message)
            .map_err(|_| AppError::ChannelClosed)
    }
}

#[derive(Debug, Default)]
struct SaveButton {
    visible: bool,
}

#[derive(Debug, Default)]
struct Panel {
    body: PanelBody,
    provenance: Option<Provenance>,
    model_used: Option<String>,
    save_button: Option<SaveButton>,
}

impl Panel {
    fn ensure_save_button(&mut self) -> &mut SaveButton {
        self.save_button.get_or_insert_with(SaveButton::default)
    }
}

/// Page-scoped agent: renders lifecycle state for one tab, gathers source
/// text and relays panel actions to the coordinator.
pub struct PanelAgent {
    context: ContextId,
    initialized: bool,
    panel: Option<Panel>,
    latest_seq: u64,
    video_url: String,
    last_summary: Option<String>,
    extractor: Arc<TextExtractor>,
    coordinator: mpsc::UnboundedSender<CoordinatorRequest>,
    view_tx: watch::Sender<PanelView>,
}

impl PanelAgent {
    pub fn spawn(
        context: ContextId,
        extractor: Arc<TextExtractor>,
        coordinator: mpsc::UnboundedSender<CoordinatorRequest>,
    ) -> PanelHandle {
        let (commands, rx) = mpsc::unbounded_channel();
        let (view_tx, view) = watch::channel(PanelView::default());

        let agent = Self {
            context,
            initialized: false,
            panel: None,
            latest_seq: 0,
            video_url: String::new(),
            last_summary: None,
            extractor,
            coordinator,
            view_tx,
        };
        tokio::spawn(agent.run(rx));

        PanelHandle {
            context,
            commands,
            view,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<AgentMessage>) {
        while let Some(message) = rx.recv().await {
            if let Err(e) = self.handle(message) {
                tracing::warn!("Panel agent {} stopping: {}", self.context, e);
                break;
            }
        }
        tracing::debug!("Panel agent {} finished", self.context);
    }

    fn handle(&mut self, message: AgentMessage) -> Result<()> {
        match message {
            AgentMessage::Summarize {
                seq,
                video_url,
                mode,
            } => {
                self.activate();
                self.latest_seq = seq;
                self.video_url = video_url.clone();
                self.show(PanelBody::Loading, None, None, false);

                let extractor = Arc::clone(&self.extractor);
                let coordinator = self.coordinator.clone();
                let context = self.context;
                tokio::spawn(async move {
                    let extracted = extractor.collect(&video_url).await;
                    let payload = CollectedText {
                        provenance: extracted.provenance,
                        text: extracted.text,
                        video_url,
                        title: extracted.title,
                        video_id: extracted.video_id,
                        mode,
                    };
                    let request = CoordinatorRequest::CollectedText {
                        context,
                        seq,
                        payload,
                    };
                    if coordinator.send(request).is_err() {
                        tracing::debug!("Coordinator gone before text for {} arrived", context);
                    }
                });
            }

            AgentMessage::SummaryReady {
                seq,
                summary,
                provenance,
                model_used,
                ..
            } => {
                if self.is_stale(seq) {
                    return Ok(());
                }
                self.show(
                    PanelBody::Summary(summary),
                    Some(provenance),
                    Some(model_used),
                    true,
                );
            }

            AgentMessage::SummaryError {
                seq,
                error,
                provenance,
                ..
            } => {
                if seq.is_some_and(|seq| self.is_stale(seq)) {
                    return Ok(());
                }
                let error = if error.trim().is_empty() {
                    DEFAULT_ERROR_TEXT.to_string()
                } else {
                    error
                };
                self.show(PanelBody::Error(error), provenance, None, false);
            }

            AgentMessage::SummarySaved {
                seq, provenance, ..
            } => {
                if seq == self.latest_seq {
                    let body = self
                        .last_summary
                        .clone()
                        .map(PanelBody::Summary)
                        .unwrap_or_default();
                    let model_used = self.panel.as_ref().and_then(|p| p.model_used.clone());
                    self.show(body, Some(provenance), model_used, false);
                } else if let Some(panel) = self.panel.as_mut() {
                    panel.ensure_save_button().visible = false;
                    self.publish();
                }
            }

            AgentMessage::SaveClicked => {
                self.send(CoordinatorRequest::SaveLastSummary {
                    context: self.context,
                })?;
            }

            AgentMessage::DismissClicked => {
                self.panel = None;
                self.publish();
                self.send(CoordinatorRequest::Dismissed {
                    context: self.context,
                })?;
            }
        }
        Ok(())
    }

    /// Runs on every activation; only missing pieces are created.
    fn activate(&mut self) {
        if !self.initialized {
            self.initialized = true;
            tracing::debug!("Panel agent {} initialized", self.context);
        }
        self.ensure_panel().ensure_save_button();
    }

    fn ensure_panel(&mut self) -> &mut Panel {
        self.panel.get_or_insert_with(Panel::default)
    }

    fn is_stale(&self, seq: u64) -> bool {
        if seq != self.latest_seq {
            tracing::debug!(
                "Panel agent {} ignoring response {} (latest {})",
                self.context,
                seq,
                self.latest_seq
            );
            return true;
        }
        false
    }

    fn show(
        &mut self,
        body: PanelBody,
        provenance: Option<Provenance>,
        model_used: Option<String>,
        allow_save: bool,
    ) {
        if let PanelBody::Summary(text) = &body {
            if !text.trim().is_empty() {
                self.last_summary = Some(text.clone());
            }
        }

        let panel = self.ensure_panel();
        panel.body = body;
        panel.provenance = provenance;
        panel.model_used = model_used;
        panel.ensure_save_button().visible = allow_save;

        self.publish();
    }

    fn publish(&self) {
        let view = match &self.panel {
            Some(panel) => PanelView {
                visible: true,
                body: panel.body.clone(),
                provenance: panel.provenance,
                model_used: panel.model_used.clone(),
                save_visible: panel.save_button.as_ref().is_some_and(|b| b.visible),
                video_url: self.video_url.clone(),
                seq: self.latest_seq,
            },
            None => PanelView {
                video_url: self.video_url.clone(),
                seq: self.latest_seq,
                ..PanelView::default()
            },
        };
        self.view_tx.send_replace(view);
    }

    fn send(&self, request: CoordinatorRequest) -> Result<()> {
        self.coordinator
            .send(request)
            .map_err(|_| AppError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SummaryMode;
    use crate::testing::{wait_for_view as wait_for, FakePageSource};

    const URL: &str = "https://www.youtube.com/watch?v=abc";

    fn spawn_agent() -> (PanelHandle, mpsc::UnboundedReceiver<CoordinatorRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let extractor = Arc::new(TextExtractor::new(Arc::new(FakePageSource::default())));
        (PanelAgent::spawn(ContextId(7), extractor, tx), rx)
    }

    fn start(handle: &PanelHandle, seq: u64) {
        handle
            .deliver(AgentMessage::Summarize {
                seq,
                video_url: URL.to_string(),
                mode: SummaryMode::Short,
            })
            .unwrap();
    }

    fn ready(seq: u64, summary: &str) -> AgentMessage {
        AgentMessage::SummaryReady {
            seq,
            summary: summary.to_string(),
            video_url: URL.to_string(),
            provenance: Provenance::Captions,
            model_used: "gemini-2.5-flash".to_string(),
        }
    }

    #[tokio::test]
    async fn shows_loading_then_forwards_collected_text() {
        let (handle, mut coordinator) = spawn_agent();
        start(&handle, 1);

        let view = wait_for(&handle, |v| v.body == PanelBody::Loading).await;
        assert!(view.visible);
        assert!(!view.save_visible);

        match coordinator.recv().await.unwrap() {
            CoordinatorRequest::CollectedText { context, seq, payload } => {
                assert_eq!(context, ContextId(7));
                assert_eq!(seq, 1);
                assert_eq!(payload.mode, SummaryMode::Short);
                assert_eq!(payload.provenance, Provenance::Metadata);
                assert_eq!(payload.video_id.as_deref(), Some("abc"));
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_ready_is_ignored() {
        let (handle, _coordinator) = spawn_agent();
        start(&handle, 1);
        start(&handle, 2);

        handle.deliver(ready(1, "old")).unwrap();
        handle.deliver(ready(2, "new")).unwrap();

        let view = wait_for(&handle, |v| v.body.is_terminal()).await;
        assert_eq!(view.body, PanelBody::Summary("new".to_string()));
        assert!(view.save_visible);
        assert_eq!(view.model_used.as_deref(), Some("gemini-2.5-flash"));
    }

    #[tokio::test]
    async fn error_disables_save_and_uses_default_text() {
        let (handle, _coordinator) = spawn_agent();
        start(&handle, 1);
        handle
            .deliver(AgentMessage::SummaryError {
                seq: Some(1),
                error: String::new(),
                video_url: URL.to_string(),
                provenance: Some(Provenance::Metadata),
            })
            .unwrap();

        let view = wait_for(&handle, |v| v.body.is_terminal()).await;
        assert_eq!(view.body, PanelBody::Error(DEFAULT_ERROR_TEXT.to_string()));
        assert!(!view.save_visible);
    }

    #[tokio::test]
    async fn saved_keeps_summary_and_hides_save() {
        let (handle, _coordinator) = spawn_agent();
        start(&handle, 1);
        handle.deliver(ready(1, "kept")).unwrap();
        handle
            .deliver(AgentMessage::SummarySaved {
                seq: 1,
                video_url: URL.to_string(),
                provenance: Provenance::Captions,
            })
            .unwrap();

        let view = wait_for(&handle, |v| v.body.is_terminal() && !v.save_visible).await;
        assert_eq!(view.body, PanelBody::Summary("kept".to_string()));
    }

    #[tokio::test]
    async fn dismiss_hides_panel_and_tells_coordinator() {
        let (handle, mut coordinator) = spawn_agent();
        handle.dismiss().unwrap();

        match coordinator.recv().await.unwrap() {
            CoordinatorRequest::Dismissed { context } => assert_eq!(context, ContextId(7)),
            other => panic!("unexpected request {other:?}"),
        }
        assert!(!handle.view().visible);
    }

    #[tokio::test]
    async fn save_click_is_relayed() {
        let (handle, mut coordinator) = spawn_agent();
        handle.save().unwrap();

        assert!(matches!(
            coordinator.recv().await.unwrap(),
            CoordinatorRequest::SaveLastSummary { context } if context == ContextId(7)
        ));
    }

    #[tokio::test]
    async fn reactivation_recreates_a_dismissed_panel() {
        let (handle, mut coordinator) = spawn_agent();
        start(&handle, 1);
        let _ = coordinator.recv().await;
        handle.dismiss().unwrap();
        let _ = coordinator.recv().await;
        assert!(!handle.view().visible);

        start(&handle, 2);
        let view = wait_for(&handle, |v| v.visible && v.seq == 2).await;
        assert_eq!(view.body, PanelBody::Loading);
    }
}
