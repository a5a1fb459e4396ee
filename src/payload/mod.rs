//! Analysis payload returned by `GET /api/data/{resourceType}`.
//!
//! Every section is optional: the backend shapes the document differently
//! for plans-only, apps-only and combined analyses, and for uploaded-file
//! versus scan-derived data. Deserialization never fails on a missing
//! section; the view layer decides what to show from what is present.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// `data_source` value for payloads built from a prior environment scan.
pub const AZURE_SCAN_SOURCE: &str = "azure_scan";

/// `status` value the backend uses for resource types without an analyzer.
pub const NOT_IMPLEMENTED_STATUS: &str = "not_implemented";

// ---------------------------------------------------------------------------
// Top-level document
// ---------------------------------------------------------------------------

/// The fetched analysis document.
///
/// Fetched fresh on every render cycle and dropped when the next one
/// arrives; nothing here is cached or merged across fetches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPayload {
    pub data_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_date: Option<String>,
    /// Set to `"not_implemented"` for resource types the backend can't analyze yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_insights: Option<CombinedInsights>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Recommendation>>,
    pub recommendation_definitions: BTreeMap<String, Definition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charts: Option<Charts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Tables>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density_metrics: Option<Vec<DensityMetric>>,
}

impl AnalysisPayload {
    /// Parse a payload from a JSON string.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Whether the data came from a prior environment scan.
    pub fn is_scan_derived(&self) -> bool {
        self.data_source == AZURE_SCAN_SOURCE
    }

    /// Whether the backend flagged this resource type as not yet supported.
    pub fn is_not_implemented(&self) -> bool {
        self.status.as_deref() == Some(NOT_IMPLEMENTED_STATUS)
    }

    /// Density metrics, treating an absent list as empty.
    pub fn density(&self) -> &[DensityMetric] {
        self.density_metrics.as_deref().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// A summary value the backend may send as an integer, a float or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Render a count the way the dashboard shows it: `12`, not `12.0`.
pub fn format_count(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Metadata describing which uploaded files fed the analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinedInsights {
    /// `"plans_only"`, `"apps_only"`, or absent for combined analyses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_apps_detailed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running_apps: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_apps: Option<u64>,
}

/// Headline numbers for the four summary cards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Summary {
    pub total_plans: Option<Scalar>,
    pub total_apps: Option<Scalar>,
    pub total_instances: Option<Scalar>,
    pub avg_apps_per_plan: Option<Scalar>,
}

/// Severity tier of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Classify free-text savings wording such as `"High"` or
    /// `"Low-Medium"`. `"high"` is checked before `"medium"`, and anything
    /// else is low.
    pub fn from_saving_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("high") {
            Self::High
        } else if lower.contains("medium") {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Badge background for this tier.
    pub fn badge_gradient(self) -> &'static str {
        match self {
            Self::High => "linear-gradient(135deg, #f093fb 0%, #f5576c 100%)",
            Self::Medium => "linear-gradient(135deg, #FFD700, #FFA500)",
            Self::Low => "linear-gradient(135deg, #4ECDC4, #95E1D3)",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// A single optimization finding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub resource: String,
    pub current_state: String,
    pub suggestion: String,
    pub potential_saving: String,
    /// Explicit severity. Older backends omit it and only send wording in
    /// `potential_saving`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl Recommendation {
    /// Effective severity: the explicit field when sent, otherwise derived
    /// from the `potential_saving` wording.
    pub fn severity(&self) -> Severity {
        self.severity
            .unwrap_or_else(|| Severity::from_saving_text(&self.potential_saving))
    }
}

/// Human-facing description of a recommendation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Definition {
    pub title: String,
    pub description: String,
    pub impact: String,
    pub category: String,
}

impl Default for Definition {
    fn default() -> Self {
        Self {
            title: "Optimization Opportunity".to_string(),
            description: "Review this resource for potential improvements".to_string(),
            impact: "Medium".to_string(),
            category: "General".to_string(),
        }
    }
}

/// Chart series keyed by widget.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Charts {
    /// Top plans by app count; only sent for apps-only analyses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plans: Option<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<Series>,
}

/// Category labels plus parallel value arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Series {
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plans: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apps: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances: Option<Vec<f64>>,
}

/// Tabular breakdowns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_stats: Option<Vec<TierStatRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_stats: Option<Vec<GroupRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_groups: Option<Vec<GroupRow>>,
}

impl Tables {
    /// Rows for the grouping table: subscriptions win over resource groups.
    pub fn group_rows(&self) -> Option<&[GroupRow]> {
        self.subscription_stats
            .as_deref()
            .or(self.resource_groups.as_deref())
    }
}

/// One row of the per-tier statistics table.
///
/// Apps-only analyses send only `Tier` and `Apps`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TierStatRow {
    #[serde(rename = "Tier", skip_serializing_if = "Option::is_none")]
    pub tier: Option<Scalar>,
    #[serde(rename = "OS", skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(rename = "Plans", skip_serializing_if = "Option::is_none")]
    pub plans: Option<f64>,
    #[serde(rename = "Apps", skip_serializing_if = "Option::is_none")]
    pub apps: Option<f64>,
    #[serde(rename = "Instances", skip_serializing_if = "Option::is_none")]
    pub instances: Option<f64>,
}

impl TierStatRow {
    /// Whether this row carries plan-level columns.
    pub fn has_plan_columns(&self) -> bool {
        self.plans.is_some() && self.instances.is_some()
    }
}

/// One row of the resource group or subscription table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupRow {
    #[serde(rename = "Subscription", skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
    #[serde(rename = "ResourceGroup", skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,
    #[serde(rename = "Resource Group", skip_serializing_if = "Option::is_none")]
    pub resource_group_spaced: Option<String>,
    #[serde(rename = "Plans", skip_serializing_if = "Option::is_none")]
    pub plans: Option<f64>,
    #[serde(rename = "Apps", skip_serializing_if = "Option::is_none")]
    pub apps: Option<f64>,
    #[serde(rename = "Instances", skip_serializing_if = "Option::is_none")]
    pub instances: Option<f64>,
}

impl GroupRow {
    /// Resource group name under either spelling the backend uses.
    pub fn resource_group_name(&self) -> &str {
        self.resource_group
            .as_deref()
            .or(self.resource_group_spaced.as_deref())
            .unwrap_or("Unknown")
    }
}

/// Apps-per-instance packing for one plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityMetric {
    pub plan_name: String,
    pub tier: String,
    pub apps: f64,
    pub instances: f64,
    pub density: f64,
    /// Bootstrap contextual color: `danger`, `warning`, `info`, `success`.
    pub color: String,
    pub status: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_parses_with_defaults() {
        let payload = AnalysisPayload::from_json("{}").unwrap();
        assert_eq!(payload.data_source, "");
        assert!(payload.charts.is_none());
        assert!(payload.recommendation_definitions.is_empty());
        assert!(payload.density().is_empty());
    }

    #[test]
    fn scan_metadata_is_recognized() {
        let payload = AnalysisPayload::from_json(
            r#"{"data_source": "azure_scan", "scan_file": "scan.json", "scan_date": "2025-01-02T03:04:05"}"#,
        )
        .unwrap();
        assert!(payload.is_scan_derived());
        assert_eq!(payload.scan_file.as_deref(), Some("scan.json"));
    }

    #[test]
    fn summary_accepts_mixed_scalars() {
        let payload = AnalysisPayload::from_json(
            r#"{"summary": {"total_plans": 4, "total_apps": "12", "avg_apps_per_plan": 2.5}}"#,
        )
        .unwrap();
        let summary = payload.summary.unwrap();
        assert_eq!(summary.total_plans.unwrap().to_string(), "4");
        assert_eq!(summary.total_apps.unwrap().to_string(), "12");
        assert_eq!(summary.avg_apps_per_plan.unwrap().to_string(), "2.5");
        assert!(summary.total_instances.is_none());
    }

    #[test]
    fn severity_from_saving_text() {
        assert_eq!(Severity::from_saving_text("High"), Severity::High);
        assert_eq!(Severity::from_saving_text("Low-Medium"), Severity::Medium);
        assert_eq!(Severity::from_saving_text("MEDIUM"), Severity::Medium);
        assert_eq!(
            Severity::from_saving_text("Up to 55% with 1-3 year reservation"),
            Severity::Low
        );
        assert_eq!(Severity::from_saving_text(""), Severity::Low);
    }

    #[test]
    fn explicit_severity_overrides_wording() {
        let rec: Recommendation = serde_json::from_str(
            r#"{"type": "x", "potential_saving": "High", "severity": "low"}"#,
        )
        .unwrap();
        assert_eq!(rec.severity(), Severity::Low);
    }

    #[test]
    fn unknown_recommendation_fields_are_ignored() {
        let rec: Recommendation = serde_json::from_str(
            r#"{"type": "oversized_plans", "resource": "plan-a", "tier": "P1v3", "priority": "High"}"#,
        )
        .unwrap();
        assert_eq!(rec.kind, "oversized_plans");
        assert_eq!(rec.resource, "plan-a");
    }

    #[test]
    fn group_rows_prefer_subscriptions() {
        let tables: Tables = serde_json::from_str(
            r#"{"subscription_stats": [{"Subscription": "sub-a", "Apps": 3}],
                "resource_groups": [{"ResourceGroup": "rg-a", "Plans": 1}]}"#,
        )
        .unwrap();
        let rows = tables.group_rows().unwrap();
        assert_eq!(rows[0].subscription.as_deref(), Some("sub-a"));
    }

    #[test]
    fn resource_group_name_accepts_both_spellings() {
        let a: GroupRow = serde_json::from_str(r#"{"ResourceGroup": "rg-a"}"#).unwrap();
        let b: GroupRow = serde_json::from_str(r#"{"Resource Group": "rg-b"}"#).unwrap();
        let c = GroupRow::default();
        assert_eq!(a.resource_group_name(), "rg-a");
        assert_eq!(b.resource_group_name(), "rg-b");
        assert_eq!(c.resource_group_name(), "Unknown");
    }

    #[test]
    fn format_count_drops_integral_fraction() {
        assert_eq!(format_count(12.0), "12");
        assert_eq!(format_count(2.25), "2.25");
        assert_eq!(format_count(0.0), "0");
    }
}
