use std::fmt;

use serde::{Deserialize, Serialize};

/// Which summary variant the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SummaryMode {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "3keys")]
    ThreeKeys,
    #[serde(rename = "short")]
    Short,
    #[serde(rename = "pareto")]
    Pareto,
}

impl SummaryMode {
    pub const ALL_MODES: [SummaryMode; 4] = [
        SummaryMode::All,
        SummaryMode::ThreeKeys,
        SummaryMode::Short,
        SummaryMode::Pareto,
    ];

    /// Unknown or absent labels fall back to `All`.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some("3keys") => Self::ThreeKeys,
            Some("short") => Self::Short,
            Some("pareto") => Self::Pareto,
            _ => Self::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::ThreeKeys => "3keys",
            Self::Short => "short",
            Self::Pareto => "pareto",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All key points",
            Self::ThreeKeys => "3 key points",
            Self::Short => "Short summary",
            Self::Pareto => "Pareto (80/20)",
        }
    }
}

impl fmt::Display for SummaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the source text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Captions,
    Metadata,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Captions => "captions",
            Self::Metadata => "metadata",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "captions" => Some(Self::Captions),
            "metadata" => Some(Self::Metadata),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Captions => "Source: video captions",
            Self::Metadata => "Source: page metadata",
        }
    }
}

/// Identifies the tab that started a summarize action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// Most recent generated, not yet saved summary for one context.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSummary {
    pub context: ContextId,
    pub seq: u64,
    pub video_url: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub summary: String,
    pub provenance: Provenance,
    pub mode: SummaryMode,
}

/// A summary the user chose to keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSummaryRecord {
    pub id: String,
    pub video_url: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub summary: String,
    #[serde(rename = "source")]
    pub provenance: Provenance,
    pub mode: SummaryMode,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}
