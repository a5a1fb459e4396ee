//! Analysis mode classification.
//!
//! A payload is classified into exactly one [`Mode`] per render cycle. Chart
//! shape is the authoritative signal because it decides what gets drawn:
//! a `charts.plans` series means apps-only, a `charts.tier` series means
//! plans-only or combined. `combined_insights` only breaks the tie between
//! plans-only and combined, or decides alone when no chart is present.
//! When the insights block names a mode the charts contradict, the chart
//! shape wins and the disagreement is reported in [`Resolution::conflict`].

use std::fmt;

use serde::Serialize;

use crate::payload::AnalysisPayload;

/// Which optional data sections an analysis carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Only the plans export was analyzed.
    PlansOnly,
    /// Only the apps export was analyzed; no plan or instance data.
    AppsOnly,
    /// Plans and apps exports analyzed together.
    Combined,
}

impl Mode {
    /// Parse the backend's mode string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "plans_only" => Some(Self::PlansOnly),
            "apps_only" => Some(Self::AppsOnly),
            "combined" => Some(Self::Combined),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlansOnly => "plans_only",
            Self::AppsOnly => "apps_only",
            Self::Combined => "combined",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payload feature that decided the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// `charts.plans` present.
    PlansChart,
    /// `charts.tier` present.
    TierChart,
    /// No chart present; `combined_insights` decided.
    Insights,
    /// Nothing to go on; plans-only assumed.
    Fallback,
}

/// Outcome of classification with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub mode: Mode,
    pub signal: Signal,
    /// Mode named by `combined_insights.mode` when it disagrees with `mode`.
    pub conflict: Option<Mode>,
}

/// Classify a payload and report which signal decided.
pub fn classify(payload: &AnalysisPayload) -> Resolution {
    let insights = payload.combined_insights.as_ref();
    let claimed = insights
        .and_then(|i| i.mode.as_deref())
        .and_then(Mode::parse);
    let enabled = insights.is_some_and(|i| i.enabled);
    let charts = payload.charts.as_ref();

    let (mode, signal) = if charts.is_some_and(|c| c.plans.is_some()) {
        (Mode::AppsOnly, Signal::PlansChart)
    } else if charts.is_some_and(|c| c.tier.is_some()) {
        if enabled || claimed == Some(Mode::Combined) {
            (Mode::Combined, Signal::TierChart)
        } else {
            (Mode::PlansOnly, Signal::TierChart)
        }
    } else if let Some(claimed) = claimed {
        (claimed, Signal::Insights)
    } else if enabled {
        (Mode::Combined, Signal::Insights)
    } else {
        (Mode::PlansOnly, Signal::Fallback)
    };

    Resolution {
        mode,
        signal,
        conflict: claimed.filter(|c| *c != mode),
    }
}

/// Classify a payload into its analysis mode.
pub fn resolve(payload: &AnalysisPayload) -> Mode {
    classify(payload).mode
}
