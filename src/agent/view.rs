use crate::models::Provenance;

pub const DEFAULT_ERROR_TEXT: &str = "An error occurred while generating the summary.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PanelBody {
    #[default]
    Empty,
    Loading,
    Summary(String),
    Error(String),
}

impl PanelBody {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Summary(_) | Self::Error(_))
    }
}

/// Snapshot of what a page agent currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelView {
    pub visible: bool,
    pub body: PanelBody,
    pub provenance: Option<Provenance>,
    pub model_used: Option<String>,
    pub save_visible: bool,
    pub video_url: String,
    /// Sequence number of the request the panel is showing.
    pub seq: u64,
}
