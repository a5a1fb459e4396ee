//! Event records for the dashboard event log.
//!
//! One line per render cycle or user action. Used by `plansight stats` to
//! see which resource types load, which fail, and in which mode.

use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

/// What a logged event was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A fetch-and-render cycle.
    Render,
    Upload,
    Delete,
    Export,
}

/// How an event ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Dashboard rendered, or action succeeded.
    Ready,
    NoData,
    MissingFile,
    NotImplemented,
    /// Transport, status or decode failure.
    Error,
    /// A completion that arrived after a newer request was issued.
    Stale,
    /// Action rejected, locally or by the backend.
    Rejected,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::NoData => "no_data",
            Self::MissingFile => "missing_file",
            Self::NotImplemented => "not_implemented",
            Self::Error => "error",
            Self::Stale => "stale",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Ready
    }
}

/// A single line of `~/.plansight/events.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleEvent {
    pub timestamp: String,
    pub kind: EventKind,
    pub resource_type: String,
    /// Data source, `csv` or `json`.
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
    pub outcome: Outcome,
    /// Resolved analysis mode for successful renders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CycleEvent {
    /// A new event stamped with the current time.
    pub fn now(kind: EventKind, resource_type: &str, source: &str, outcome: Outcome) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            kind,
            resource_type: resource_type.to_string(),
            source: source.to_string(),
            request_id: None,
            outcome,
            mode: None,
            detail: None,
        }
    }

    pub fn with_request(mut self, id: u64) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
