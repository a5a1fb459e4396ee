//! Banners shown above the dashboard: analysis mode and data source.

use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;

use crate::mode::Mode;
use crate::payload::{AnalysisPayload, CombinedInsights};

/// Visual tone of a banner, as a Bootstrap alert variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Info,
    Success,
    Primary,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Primary => "primary",
        }
    }
}

/// The analysis mode banner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeBanner {
    pub tone: Tone,
    pub heading: String,
    pub body: String,
    pub badge: String,
}

/// Build the mode banner. Only shown when the payload carries
/// `combined_insights`; the wording follows the resolved mode.
pub fn mode_banner(mode: Mode, payload: &AnalysisPayload) -> Option<ModeBanner> {
    let insights = payload.combined_insights.as_ref()?;
    Some(match mode {
        Mode::AppsOnly => ModeBanner {
            tone: Tone::Info,
            heading: "Apps-Only Analysis Mode".to_string(),
            body: apps_only_body(insights),
            badge: "Limited Analysis".to_string(),
        },
        Mode::Combined => ModeBanner {
            tone: Tone::Success,
            heading: "Combined Analysis Mode Active".to_string(),
            body: combined_body(insights),
            badge: "Enhanced Analysis".to_string(),
        },
        Mode::PlansOnly => ModeBanner {
            tone: Tone::Primary,
            heading: "Plans Analysis Mode".to_string(),
            body: "Analyzing App Service Plans data. Upload Apps CSV (file 2) for enhanced \
                   app-level insights."
                .to_string(),
            badge: "Standard Analysis".to_string(),
        },
    })
}

fn apps_only_body(insights: &CombinedInsights) -> String {
    let mut parts = vec![format!(
        "Analyzing App Services data only ({} apps found).",
        insights.total_apps_detailed.unwrap_or(0)
    )];
    if let Some(running) = insights.running_apps.filter(|n| *n > 0) {
        parts.push(format!(
            "{running} running, {} stopped.",
            insights.stopped_apps.unwrap_or(0)
        ));
    }
    parts.push("Upload Plans CSV (file 1) for complete cost optimization insights.".to_string());
    parts.join(" ")
}

fn combined_body(insights: &CombinedInsights) -> String {
    let mut body = format!(
        "Analyzing {} files: Plans & Apps data combined for deeper insights.",
        insights.files_count.unwrap_or(2)
    );
    if let Some(total) = insights.total_apps_detailed.filter(|n| *n > 0) {
        body.push_str(&format!(" Found {total} apps total"));
    }
    if let Some(running) = insights.running_apps.filter(|n| *n > 0) {
        body.push_str(&format!(
            " ({running} running, {} stopped)",
            insights.stopped_apps.unwrap_or(0)
        ));
    }
    body
}

/// The prior-scan data source banner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceBanner {
    pub heading: String,
    pub scan_file: String,
    pub scanned: String,
}

/// Build the data-source banner for scan-derived payloads.
pub fn source_banner(payload: &AnalysisPayload) -> Option<SourceBanner> {
    if !payload.is_scan_derived() {
        return None;
    }
    Some(SourceBanner {
        heading: "Using Azure Scan Data".to_string(),
        scan_file: payload
            .scan_file
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        scanned: payload
            .scan_date
            .as_deref()
            .map(format_scan_date)
            .unwrap_or_else(|| "unknown".to_string()),
    })
}

/// Format a scan timestamp for display.
///
/// RFC 3339 timestamps are converted to local time. Offset-less ISO
/// timestamps are shown as written. Anything else is passed through.
pub fn format_scan_date(raw: &str) -> String {
    const DISPLAY: &str = "%Y-%m-%d %H:%M:%S";
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format(DISPLAY).to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format(DISPLAY).to_string();
    }
    raw.to_string()
}
