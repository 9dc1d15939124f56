use crate::agent::{PanelBody, PanelHandle, PanelView};
use crate::coordinator::CoordinatorHandle;
use crate::error::Result;
use crate::extract::video_id_from_url;
use crate::models::{ContextId, SummaryMode};
use crate::tui::AppAction;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// One open video page.
pub struct Tab {
    pub context: ContextId,
    pub video_url: String,
    pub panel: Option<PanelHandle>,
}

impl Tab {
    pub fn title(&self) -> String {
        video_id_from_url(&self.video_url).unwrap_or_else(|| self.video_url.clone())
    }

    pub fn view(&self) -> Option<PanelView> {
        self.panel.as_ref().map(|p| p.view())
    }
}

pub struct App {
    // Data
    pub tabs: Vec<Tab>,
    next_context: u64,

    // UI State
    pub selected_tab: usize,
    pub show_help: bool,
    pub url_input_active: bool,
    pub url_input: String,
    pub status_message: Option<String>,
    spinner_frame: usize,

    // Services
    coordinator: CoordinatorHandle,
}

impl App {
    pub fn new(coordinator: CoordinatorHandle, initial_url: Option<String>) -> Self {
        let mut app = Self {
            tabs: Vec::new(),
            next_context: 1,
            selected_tab: 0,
            show_help: false,
            url_input_active: false,
            url_input: String::new(),
            status_message: None,
            spinner_frame: 0,
            coordinator,
        };

        match initial_url {
            Some(url) => app.open_tab(url),
            None => app.url_input_active = true,
        }
        app
    }

    pub fn selected(&self) -> Option<&Tab> {
        self.tabs.get(self.selected_tab)
    }

    pub fn tick_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame]
    }

    pub fn is_loading(&self) -> bool {
        self.selected()
            .and_then(|t| t.view())
            .is_some_and(|v| v.visible && v.body == PanelBody::Loading)
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::NextTab => {
                if !self.tabs.is_empty() {
                    self.selected_tab = (self.selected_tab + 1) % self.tabs.len();
                }
            }

            AppAction::PrevTab => {
                if !self.tabs.is_empty() {
                    self.selected_tab = (self.selected_tab + self.tabs.len() - 1) % self.tabs.len();
                }
            }

            AppAction::Summarize(mode) => {
                self.summarize(mode).await?;
            }

            AppAction::SaveSummary => {
                if let Some(panel) = self.selected().and_then(|t| t.panel.clone()) {
                    panel.save()?;
                } else {
                    self.status_message = Some("Nothing to save yet".to_string());
                }
            }

            AppAction::DismissPanel => {
                if let Some(panel) = self.selected().and_then(|t| t.panel.clone()) {
                    if panel.view().visible {
                        panel.dismiss()?;
                    }
                }
            }

            AppAction::CloseTab => {
                self.close_tab()?;
            }

            AppAction::OpenInBrowser => {
                if let Some(tab) = self.selected() {
                    let url = tab.video_url.clone();
                    let _ = open::that(&url);
                }
            }

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }

            AppAction::OpenTabStart => {
                self.url_input_active = true;
                self.url_input.clear();
            }

            AppAction::UrlInputChar(c) => {
                self.url_input.push(c);
            }

            AppAction::UrlInputBackspace => {
                self.url_input.pop();
            }

            AppAction::UrlInputConfirm => {
                let url = self.url_input.trim().to_string();
                if !url.is_empty() {
                    self.open_tab(url);
                }
                self.url_input_active = false;
                self.url_input.clear();
            }

            AppAction::UrlInputCancel => {
                self.url_input_active = false;
                self.url_input.clear();
            }
        }

        Ok(false)
    }

    fn open_tab(&mut self, video_url: String) {
        let context = ContextId(self.next_context);
        self.next_context += 1;
        self.tabs.push(Tab {
            context,
            video_url,
            panel: None,
        });
        self.selected_tab = self.tabs.len() - 1;
        self.status_message = None;
    }

    async fn summarize(&mut self, mode: SummaryMode) -> Result<()> {
        let Some(tab) = self.tabs.get_mut(self.selected_tab) else {
            self.status_message = Some("Open a video first (o)".to_string());
            return Ok(());
        };

        let panel = self
            .coordinator
            .summarize(tab.context, &tab.video_url, mode)
            .await?;
        tab.panel = Some(panel);
        self.status_message = Some(format!("Requested: {}", mode.label()));
        Ok(())
    }

    fn close_tab(&mut self) -> Result<()> {
        if self.selected_tab >= self.tabs.len() {
            return Ok(());
        }
        let tab = self.tabs.remove(self.selected_tab);
        self.coordinator.close_context(tab.context)?;

        if self.selected_tab >= self.tabs.len() && !self.tabs.is_empty() {
            self.selected_tab = self.tabs.len() - 1;
        }
        Ok(())
    }
}
