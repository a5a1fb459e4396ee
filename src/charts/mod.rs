//! Chart.js configuration builder.
//!
//! Turns payload series into Chart.js configurations. Drawing happens in
//! the browser; everything that Chart.js would otherwise compute in a
//! JavaScript callback (tooltip percentages, untruncated tooltip titles) is
//! precomputed here and shipped alongside the config in [`Tooltips`].

pub mod registry;

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Value, json};

use crate::payload::{Series, format_count};

pub use registry::ChartRegistry;

/// Longest label shown untruncated on the plans-by-app-count chart.
pub const MAX_LABEL_CHARS: usize = 25;

/// Characters kept from a truncated label, before the ellipsis.
pub const TRUNCATED_PREFIX_CHARS: usize = 22;

const PRIMARY: &str = "#0078d4";
const SUCCESS: &str = "#107c10";
const WARM: &str = "#ffb900";
const MIXED: [&str; 6] = [
    "#0078d4", "#107c10", "#ffb900", "#d83b01", "#00b7c3", "#8764b8",
];
const TOOLTIP_BG: &str = "rgba(0, 0, 0, 0.8)";
const GRID_COLOR: &str = "rgba(0, 0, 0, 0.05)";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Chart widget flavours the dashboard draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    /// Tier distribution: plans, apps and instances side by side.
    BarGrouped,
    /// Location distribution.
    Donut,
    /// Operating system distribution.
    Pie,
    /// Plans ranked by app count, apps-only analyses.
    BarHorizontalTop10,
}

/// Tooltip text computed ahead of time, indexed by data point.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tooltips {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// A chart ready to hand to Chart.js.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// DOM id of the canvas this chart draws into.
    pub mount: String,
    pub kind: ChartKind,
    pub config: Value,
    pub tooltips: Tooltips,
}

impl ChartSpec {
    /// Dataset label of the first dataset, if any.
    pub fn dataset_label(&self, index: usize) -> Option<&str> {
        self.config["data"]["datasets"][index]["label"].as_str()
    }

    /// Category labels displayed on the axis or legend.
    pub fn labels(&self) -> Vec<&str> {
        self.config["data"]["labels"]
            .as_array()
            .map(|a| a.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Builds charts for the canvases that exist on the page.
///
/// Asking for a chart whose mount is missing is not an error: the widget is
/// optional and simply doesn't render.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    mounts: BTreeSet<String>,
}

impl ChartRenderer {
    pub fn new<I, S>(mounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mounts: mounts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_mount(&self, mount: &str) -> bool {
        self.mounts.contains(mount)
    }

    /// Render into `mount`, or `None` when the page has no such canvas.
    pub fn render_into(&self, mount: &str, kind: ChartKind, series: &Series) -> Option<ChartSpec> {
        if !self.has_mount(mount) {
            return None;
        }
        let (config, tooltips) = build(kind, series);
        Some(ChartSpec {
            mount: mount.to_string(),
            kind,
            config,
            tooltips,
        })
    }
}

/// Build the config and tooltips for a chart kind.
pub fn build(kind: ChartKind, series: &Series) -> (Value, Tooltips) {
    match kind {
        ChartKind::BarGrouped => (grouped_bar(series), Tooltips::default()),
        ChartKind::Donut => share_chart(series, "doughnut", ShareLabels::location()),
        ChartKind::Pie => share_chart(series, "pie", ShareLabels::os()),
        ChartKind::BarHorizontalTop10 => horizontal_top10(series),
    }
}

// ---------------------------------------------------------------------------
// Grouped bar
// ---------------------------------------------------------------------------

fn grouped_bar(series: &Series) -> Value {
    let dataset = |label: &str, values: &Option<Vec<f64>>, color: &str| {
        json!({
            "label": label,
            "data": values.clone().unwrap_or_default(),
            "backgroundColor": color,
            "borderColor": color,
            "borderWidth": 1,
        })
    };

    json!({
        "type": "bar",
        "data": {
            "labels": series.labels,
            "datasets": [
                dataset("Plans", &series.plans, PRIMARY),
                dataset("Apps", &series.apps, SUCCESS),
                dataset("Instances", &series.instances, WARM),
            ],
        },
        "options": {
            "responsive": true,
            "maintainAspectRatio": true,
            "plugins": {
                "legend": { "position": "bottom", "labels": { "padding": 15, "font": { "size": 12 } } },
                "title": { "display": false },
                "tooltip": {
                    "backgroundColor": TOOLTIP_BG,
                    "padding": 12,
                    "titleFont": { "size": 14 },
                    "bodyFont": { "size": 13 },
                },
            },
            "scales": {
                "y": { "beginAtZero": true, "ticks": { "precision": 0 }, "grid": { "color": GRID_COLOR } },
                "x": { "grid": { "display": false } },
            },
        },
    })
}

// ---------------------------------------------------------------------------
// Donut / pie
// ---------------------------------------------------------------------------

/// Wording for a share chart, depending on which series it shows.
struct ShareLabels {
    apps: &'static str,
    plans: &'static str,
    legend: &'static str,
    /// Include the lower-cased dataset label after the value in tooltips.
    unit_in_tooltip: bool,
}

impl ShareLabels {
    fn location() -> Self {
        Self {
            apps: "Apps by Location",
            plans: "Plans by Location",
            legend: "right",
            unit_in_tooltip: false,
        }
    }

    fn os() -> Self {
        Self {
            apps: "Apps",
            plans: "Plans",
            legend: "bottom",
            unit_in_tooltip: true,
        }
    }
}

fn share_chart(series: &Series, chart_type: &str, wording: ShareLabels) -> (Value, Tooltips) {
    let (values, label) = match (&series.apps, &series.plans) {
        (Some(apps), _) => (apps.clone(), wording.apps),
        (None, Some(plans)) => (plans.clone(), wording.plans),
        (None, None) => (Vec::new(), wording.plans),
    };

    let pcts = percentages(&values);
    let tooltip_labels = series
        .labels
        .iter()
        .zip(values.iter().zip(&pcts))
        .map(|(name, (value, pct))| {
            if wording.unit_in_tooltip {
                format!(
                    "{name}: {} {} ({pct:.1}%)",
                    format_count(*value),
                    label.to_lowercase()
                )
            } else {
                format!("{name}: {} ({pct:.1}%)", format_count(*value))
            }
        })
        .collect();

    let colors: Vec<&str> = MIXED.iter().copied().take(series.labels.len().max(1)).collect();

    let config = json!({
        "type": chart_type,
        "data": {
            "labels": series.labels,
            "datasets": [{
                "label": label,
                "data": values,
                "backgroundColor": colors,
                "borderWidth": 2,
                "borderColor": "#fff",
            }],
        },
        "options": {
            "responsive": true,
            "maintainAspectRatio": true,
            "plugins": {
                "legend": { "position": wording.legend, "labels": { "padding": 15, "font": { "size": 12 } } },
                "tooltip": { "backgroundColor": TOOLTIP_BG, "padding": 12 },
            },
        },
    });

    (
        config,
        Tooltips {
            titles: None,
            labels: Some(tooltip_labels),
        },
    )
}

/// Share of each value in the series total, in percent, rounded to one
/// decimal. An all-zero series yields zeros.
pub fn percentages(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    values
        .iter()
        .map(|v| {
            if total == 0.0 {
                0.0
            } else {
                (v / total * 1000.0).round() / 10.0
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Horizontal top-10
// ---------------------------------------------------------------------------

fn horizontal_top10(series: &Series) -> (Value, Tooltips) {
    // Order comes from the backend and is kept as is.
    let display: Vec<String> = series.labels.iter().map(|l| truncate_label(l)).collect();

    let config = json!({
        "type": "bar",
        "data": {
            "labels": display,
            "datasets": [{
                "label": "Apps",
                "data": series.apps.clone().unwrap_or_default(),
                "backgroundColor": PRIMARY,
                "borderWidth": 0,
            }],
        },
        "options": {
            "responsive": true,
            "maintainAspectRatio": true,
            "indexAxis": "y",
            "plugins": {
                "legend": { "display": false },
                "tooltip": {
                    "backgroundColor": TOOLTIP_BG,
                    "padding": 12,
                    "titleFont": { "size": 14 },
                    "bodyFont": { "size": 13 },
                },
            },
            "scales": {
                "x": {
                    "beginAtZero": true,
                    "ticks": { "precision": 0 },
                    "grid": { "color": GRID_COLOR },
                    "title": { "display": true, "text": "Number of Apps" },
                },
                "y": { "grid": { "display": false } },
            },
        },
    });

    (
        config,
        Tooltips {
            titles: Some(series.labels.clone()),
            labels: None,
        },
    )
}

/// Shorten a label longer than 25 characters to its first 22 plus `...`.
pub fn truncate_label(label: &str) -> String {
    if label.chars().count() > MAX_LABEL_CHARS {
        let prefix: String = label.chars().take(TRUNCATED_PREFIX_CHARS).collect();
        format!("{prefix}...")
    } else {
        label.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn series(labels: &[&str]) -> Series {
        Series {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            ..Series::default()
        }
    }

    #[test]
    fn truncate_label_limits() {
        let long = "abcdefghijklmnopqrstuvwxyz1234"; // 30 chars
        let out = truncate_label(long);
        assert_eq!(out, "abcdefghijklmnopqrstuv...");
        assert_eq!(out.chars().count(), 25);

        let short = "abcdefghijklmnopqrst"; // 20 chars
        assert_eq!(truncate_label(short), short);

        let exact = "a".repeat(25);
        assert_eq!(truncate_label(&exact), exact);
    }

    #[test]
    fn truncate_label_counts_characters_not_bytes() {
        let label = "é".repeat(26);
        let out = truncate_label(&label);
        assert_eq!(out.chars().count(), 25);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn percentages_sum_to_hundred() {
        let pcts = percentages(&[1.0, 1.0, 1.0]);
        assert_eq!(pcts, vec![33.3, 33.3, 33.3]);
        let sum: f64 = pcts.iter().sum();
        assert!((sum - 100.0).abs() <= 0.1 + 1e-9);
    }

    #[test]
    fn percentages_of_zero_total() {
        assert_eq!(percentages(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert!(percentages(&[]).is_empty());
    }

    #[test]
    fn grouped_bar_has_three_series() {
        let mut s = series(&["F1", "P1v3"]);
        s.plans = Some(vec![5.0, 1.0]);
        s.apps = Some(vec![12.0, 2.0]);
        s.instances = Some(vec![20.0, 3.0]);
        let (config, _) = build(ChartKind::BarGrouped, &s);
        let datasets = config["data"]["datasets"].as_array().unwrap();
        assert_eq!(datasets.len(), 3);
        assert_eq!(datasets[0]["label"], "Plans");
        assert_eq!(datasets[2]["data"][0], 20.0);
        assert_eq!(config["options"]["scales"]["y"]["beginAtZero"], true);
        assert_eq!(config["options"]["scales"]["y"]["ticks"]["precision"], 0);
    }

    #[test]
    fn donut_prefers_apps_series() {
        let mut s = series(&["eastus", "westus"]);
        s.plans = Some(vec![1.0, 1.0]);
        s.apps = Some(vec![3.0, 1.0]);
        let (config, tips) = build(ChartKind::Donut, &s);
        assert_eq!(config["type"], "doughnut");
        assert_eq!(config["data"]["datasets"][0]["label"], "Apps by Location");
        assert_eq!(
            tips.labels.unwrap(),
            vec!["eastus: 3 (75.0%)", "westus: 1 (25.0%)"]
        );
    }

    #[test]
    fn donut_falls_back_to_plans_series() {
        let mut s = series(&["eastus"]);
        s.plans = Some(vec![4.0]);
        s.instances = Some(vec![9.0]);
        let (config, _) = build(ChartKind::Donut, &s);
        assert_eq!(config["data"]["datasets"][0]["label"], "Plans by Location");
        assert_eq!(config["data"]["datasets"][0]["data"][0], 4.0);
    }

    #[test]
    fn pie_tooltip_names_the_unit() {
        let mut s = series(&["Linux", "Windows"]);
        s.plans = Some(vec![1.0, 3.0]);
        let (config, tips) = build(ChartKind::Pie, &s);
        assert_eq!(config["type"], "pie");
        assert_eq!(config["data"]["datasets"][0]["backgroundColor"].as_array().unwrap().len(), 2);
        assert_eq!(tips.labels.unwrap()[0], "Linux: 1 plans (25.0%)");
    }

    #[test]
    fn horizontal_chart_keeps_full_labels_for_tooltips() {
        let long = "a-very-long-app-service-plan-name";
        let mut s = series(&[long, "short"]);
        s.apps = Some(vec![14.0, 2.0]);
        let (config, tips) = build(ChartKind::BarHorizontalTop10, &s);
        assert_eq!(config["options"]["indexAxis"], "y");
        assert_eq!(config["data"]["labels"][0], "a-very-long-app-servic...");
        assert_eq!(tips.titles.unwrap()[0], long);
    }

    #[test]
    fn missing_mount_skips_rendering() {
        let renderer = ChartRenderer::new(["tierChart"]);
        let s = series(&["x"]);
        assert!(renderer.render_into("osChart", ChartKind::Pie, &s).is_none());
        let spec = renderer
            .render_into("tierChart", ChartKind::BarGrouped, &s)
            .unwrap();
        assert_eq!(spec.mount, "tierChart");
        assert_eq!(spec.labels(), vec!["x"]);
    }
}
