//! Event log aggregation for `plansight stats`.
//!
//! Summarizes render cycles and actions per resource type, per outcome and
//! per analysis mode.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analytics::events::{CycleEvent, EventKind, Outcome};
use crate::analytics::logger::EventLog;

// ---------------------------------------------------------------------------
// Aggregated stats
// ---------------------------------------------------------------------------

/// Summary statistics for `plansight stats`.
#[derive(Debug, Default, Serialize)]
pub struct Stats {
    pub total_events: usize,
    pub renders: usize,
    pub successful_renders: usize,
    pub actions: usize,
    pub outcomes: BTreeMap<String, usize>,
    /// Successful renders per resolved mode.
    pub modes: BTreeMap<String, usize>,
    pub resources: Vec<ResourceStat>,
}

impl Stats {
    /// Share of render cycles that reached the dashboard, in percent.
    pub fn render_success_pct(&self) -> f64 {
        if self.renders == 0 {
            0.0
        } else {
            (self.successful_renders as f64 / self.renders as f64) * 100.0
        }
    }
}

/// Per-resource-type aggregated statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceStat {
    pub resource_type: String,
    pub renders: usize,
    pub ready: usize,
    pub failed: usize,
    pub uploads: usize,
    pub deletes: usize,
    /// Mode of the most recent successful render.
    pub last_mode: Option<String>,
}

// ---------------------------------------------------------------------------
// Stats computation
// ---------------------------------------------------------------------------

/// Compute stats from the event log, optionally limited to the last `days`.
pub fn compute_stats(log: &EventLog, days: Option<u32>) -> Stats {
    build_stats(&log.read_since_days(days))
}

fn build_stats(events: &[CycleEvent]) -> Stats {
    let mut stats = Stats {
        total_events: events.len(),
        ..Stats::default()
    };
    let mut resources: BTreeMap<&str, ResourceStat> = BTreeMap::new();

    for event in events {
        *stats
            .outcomes
            .entry(event.outcome.as_str().to_string())
            .or_default() += 1;

        let resource = resources
            .entry(event.resource_type.as_str())
            .or_insert_with(|| ResourceStat {
                resource_type: event.resource_type.clone(),
                ..ResourceStat::default()
            });

        match event.kind {
            EventKind::Render => {
                // Stale completions never reached the screen.
                if event.outcome == Outcome::Stale {
                    continue;
                }
                stats.renders += 1;
                resource.renders += 1;
                if event.outcome.is_success() {
                    stats.successful_renders += 1;
                    resource.ready += 1;
                    if let Some(mode) = &event.mode {
                        *stats.modes.entry(mode.clone()).or_default() += 1;
                        resource.last_mode = Some(mode.clone());
                    }
                } else {
                    resource.failed += 1;
                }
            }
            EventKind::Upload => {
                stats.actions += 1;
                resource.uploads += 1;
            }
            EventKind::Delete => {
                stats.actions += 1;
                resource.deletes += 1;
            }
            EventKind::Export => stats.actions += 1,
        }
    }

    stats.resources = resources.into_values().collect();
    // Busiest resource types first
    stats
        .resources
        .sort_by(|a, b| b.renders.cmp(&a.renders).then(a.resource_type.cmp(&b.resource_type)));
    stats
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
