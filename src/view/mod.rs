//! Mode-driven layout adaptation.
//!
//! The dashboard is a fixed set of regions keyed by [`RegionId`]. [`adapt`]
//! starts from the baseline layout on every call and applies the mode's
//! relabels plus the hide rules for absent data, so the result depends only
//! on the mode and the payload, never on what a previous cycle did.
//!
//! | Region              | plans_only      | apps_only             | combined        |
//! |---------------------|-----------------|-----------------------|-----------------|
//! | Total Instances     | shown           | hidden                | shown           |
//! | Tier/Plans chart    | tier bars       | top plans by apps     | tier bars       |
//! | Tier table columns  | Tier, (OS,) Plans, Apps, Instances | Tier, Apps | as plans_only |
//! | Group table columns | Resource Group, Plans, Apps, Instances | Subscription, Apps | as plans_only |
//! | Density             | if non-empty    | hidden                | if non-empty    |
//!
//! Absent backing data hides a region in every mode.

pub mod banner;
pub mod tables;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::charts::ChartKind;
use crate::mode::Mode;
use crate::payload::{AnalysisPayload, Charts, Series};

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// Stable identifier for each dashboard region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionId {
    PlansCard,
    AppsCard,
    InstancesCard,
    AvgAppsCard,
    Recommendations,
    TierChart,
    LocationChart,
    OsChart,
    TierTable,
    GroupTable,
    Density,
}

impl RegionId {
    pub const ALL: [RegionId; 11] = [
        Self::PlansCard,
        Self::AppsCard,
        Self::InstancesCard,
        Self::AvgAppsCard,
        Self::Recommendations,
        Self::TierChart,
        Self::LocationChart,
        Self::OsChart,
        Self::TierTable,
        Self::GroupTable,
        Self::Density,
    ];

    /// Chart regions in the order they appear on the page.
    pub const CHARTS: [RegionId; 3] = [Self::TierChart, Self::LocationChart, Self::OsChart];

    /// DOM id of the element backing this region.
    pub fn dom_id(self) -> &'static str {
        match self {
            Self::PlansCard => "totalPlans",
            Self::AppsCard => "totalApps",
            Self::InstancesCard => "totalInstances",
            Self::AvgAppsCard => "avgApps",
            Self::Recommendations => "recommendationsList",
            Self::TierChart => "tierChart",
            Self::LocationChart => "locationChart",
            Self::OsChart => "osChart",
            Self::TierTable => "tierStatsTable",
            Self::GroupTable => "resourceGroupTable",
            Self::Density => "densityTable",
        }
    }

    fn default_title(self) -> &'static str {
        match self {
            Self::PlansCard => "Total Plans",
            Self::AppsCard => "Total Apps",
            Self::InstancesCard => "Total Instances",
            Self::AvgAppsCard => "Avg Apps per Plan",
            Self::Recommendations => "Cost Optimization Recommendations",
            Self::TierChart => "Distribution by Tier",
            Self::LocationChart => "Distribution by Location",
            Self::OsChart => "Operating System",
            Self::TierTable => "Statistics by Tier",
            Self::GroupTable => "Top Resource Groups",
            Self::Density => "App Density Analysis",
        }
    }
}

/// A table column header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub label: String,
    /// Right-aligned numeric column.
    pub numeric: bool,
}

impl Column {
    pub fn text(label: &str) -> Self {
        Self {
            label: label.to_string(),
            numeric: false,
        }
    }

    pub fn numeric(label: &str) -> Self {
        Self {
            label: label.to_string(),
            numeric: true,
        }
    }
}

/// Display state of one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub visible: bool,
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Column>,
}

/// The full region map for one render cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    regions: BTreeMap<RegionId, Region>,
}

impl Layout {
    /// Every region visible with its default title and headers.
    pub fn baseline() -> Self {
        let regions = RegionId::ALL
            .into_iter()
            .map(|id| {
                let region = Region {
                    visible: true,
                    title: id.default_title().to_string(),
                    columns: match id {
                        RegionId::TierTable => plan_tier_columns(false),
                        RegionId::GroupTable => resource_group_columns(),
                        _ => Vec::new(),
                    },
                };
                (id, region)
            })
            .collect();
        Self { regions }
    }

    pub fn region(&self, id: RegionId) -> &Region {
        // Every id is inserted by `baseline`.
        &self.regions[&id]
    }

    pub fn is_visible(&self, id: RegionId) -> bool {
        self.region(id).visible
    }

    pub fn title(&self, id: RegionId) -> &str {
        &self.region(id).title
    }

    pub fn columns(&self, id: RegionId) -> &[Column] {
        &self.region(id).columns
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &Region)> {
        self.regions.iter().map(|(id, r)| (*id, r))
    }

    fn region_mut(&mut self, id: RegionId) -> &mut Region {
        self.regions
            .entry(id)
            .or_insert_with(|| Region {
                visible: true,
                title: id.default_title().to_string(),
                columns: Vec::new(),
            })
    }

    fn hide(&mut self, id: RegionId) {
        self.region_mut(id).visible = false;
    }

    fn hide_unless(&mut self, id: RegionId, present: bool) {
        if !present {
            self.hide(id);
        }
    }

    fn set_title(&mut self, id: RegionId, title: &str) {
        self.region_mut(id).title = title.to_string();
    }

    fn set_columns(&mut self, id: RegionId, columns: Vec<Column>) {
        self.region_mut(id).columns = columns;
    }
}

fn plan_tier_columns(with_os: bool) -> Vec<Column> {
    let mut cols = vec![Column::text("Tier")];
    if with_os {
        cols.push(Column::text("OS"));
    }
    cols.extend([
        Column::numeric("Plans"),
        Column::numeric("Apps"),
        Column::numeric("Instances"),
    ]);
    cols
}

fn resource_group_columns() -> Vec<Column> {
    vec![
        Column::text("Resource Group"),
        Column::numeric("Plans"),
        Column::numeric("Apps"),
        Column::numeric("Instances"),
    ]
}

// ---------------------------------------------------------------------------
// Adaptation
// ---------------------------------------------------------------------------

/// Compute the region map for `mode` and the sections present in `payload`.
pub fn adapt(mode: Mode, payload: &AnalysisPayload) -> Layout {
    let mut layout = Layout::baseline();
    let charts = payload.charts.as_ref();
    let tables = payload.tables.as_ref();

    // Summary cards
    let has_summary = payload.summary.is_some();
    for card in [
        RegionId::PlansCard,
        RegionId::AppsCard,
        RegionId::InstancesCard,
        RegionId::AvgAppsCard,
    ] {
        layout.hide_unless(card, has_summary);
    }
    if mode == Mode::AppsOnly {
        layout.hide(RegionId::InstancesCard);
        layout.set_title(RegionId::PlansCard, "Unique Plans Referenced");
    }

    // Recommendations
    layout.hide_unless(RegionId::Recommendations, payload.recommendations.is_some());
    match mode {
        Mode::PlansOnly => layout.set_title(
            RegionId::Recommendations,
            "Plan Optimization Recommendations",
        ),
        Mode::Combined => layout.set_title(
            RegionId::Recommendations,
            "Combined Optimization Recommendations",
        ),
        Mode::AppsOnly => {}
    }

    // Charts
    match charts.and_then(|c| tier_chart_choice(mode, c)) {
        Some((ChartKind::BarHorizontalTop10, _)) => {
            layout.set_title(RegionId::TierChart, "Top 10 Plans by App Count");
        }
        Some(_) if mode == Mode::AppsOnly => {
            layout.set_title(RegionId::TierChart, "Apps by Pricing Tier");
        }
        Some(_) => {}
        None => layout.hide(RegionId::TierChart),
    }
    layout.hide_unless(
        RegionId::LocationChart,
        charts.is_some_and(|c| c.location.is_some()),
    );
    layout.hide_unless(RegionId::OsChart, charts.is_some_and(|c| c.os.is_some()));

    // Tier table
    let tier_rows = tables.and_then(|t| t.tier_stats.as_deref());
    layout.hide_unless(RegionId::TierTable, tier_rows.is_some());
    let tier_columns = match mode {
        Mode::AppsOnly => vec![Column::text("Tier"), Column::numeric("Apps")],
        Mode::PlansOnly | Mode::Combined => {
            plan_tier_columns(tier_rows.is_some_and(|rows| rows.iter().any(|r| r.os.is_some())))
        }
    };
    layout.set_columns(RegionId::TierTable, tier_columns);

    // Group table
    layout.hide_unless(
        RegionId::GroupTable,
        tables.and_then(|t| t.group_rows()).is_some(),
    );
    if mode == Mode::AppsOnly {
        layout.set_title(RegionId::GroupTable, "Top Subscriptions");
        layout.set_columns(
            RegionId::GroupTable,
            vec![Column::text("Subscription"), Column::numeric("Apps")],
        );
    }

    // Density
    let has_density = !payload.density().is_empty();
    layout.hide_unless(RegionId::Density, has_density && mode != Mode::AppsOnly);

    layout
}

/// Which chart fills the tier/plans slot, and from which series.
///
/// Apps-only analyses prefer the plans-by-app-count series; the others
/// prefer the tier distribution. Either falls back to the other series when
/// its preferred one is absent.
pub fn tier_chart_choice(mode: Mode, charts: &Charts) -> Option<(ChartKind, &Series)> {
    let plans = charts
        .plans
        .as_ref()
        .map(|s| (ChartKind::BarHorizontalTop10, s));
    let tier = charts.tier.as_ref().map(|s| (ChartKind::BarGrouped, s));
    match mode {
        Mode::AppsOnly => plans.or(tier),
        Mode::PlansOnly | Mode::Combined => tier.or(plans),
    }
}

/// Charts to draw for a layout: region, chart kind and source series.
pub fn chart_plan<'a>(
    mode: Mode,
    payload: &'a AnalysisPayload,
    layout: &Layout,
) -> Vec<(RegionId, ChartKind, &'a Series)> {
    let Some(charts) = payload.charts.as_ref() else {
        return Vec::new();
    };

    let mut plan = Vec::new();
    if layout.is_visible(RegionId::TierChart)
        && let Some((kind, series)) = tier_chart_choice(mode, charts)
    {
        plan.push((RegionId::TierChart, kind, series));
    }
    if layout.is_visible(RegionId::LocationChart)
        && let Some(series) = charts.location.as_ref()
    {
        plan.push((RegionId::LocationChart, ChartKind::Donut, series));
    }
    if layout.is_visible(RegionId::OsChart)
        && let Some(series) = charts.os.as_ref()
    {
        plan.push((RegionId::OsChart, ChartKind::Pie, series));
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> AnalysisPayload {
        AnalysisPayload::from_json(json).unwrap()
    }

    #[test]
    fn baseline_shows_everything() {
        let layout = Layout::baseline();
        assert!(RegionId::ALL.iter().all(|id| layout.is_visible(*id)));
        assert_eq!(layout.title(RegionId::InstancesCard), "Total Instances");
    }

    #[test]
    fn empty_payload_hides_every_data_region() {
        let layout = adapt(Mode::PlansOnly, &AnalysisPayload::default());
        assert!(RegionId::ALL.iter().all(|id| !layout.is_visible(*id)));
    }

    #[test]
    fn apps_only_relabels_and_hides() {
        let p = payload(
            r#"{"summary": {"total_plans": 3},
                "charts": {"plans": {"labels": ["p"], "apps": [4]}},
                "tables": {"tier_stats": [{"Tier": "P1v3", "Apps": 4}],
                           "subscription_stats": [{"Subscription": "s", "Apps": 4}]},
                "density_metrics": [{"plan_name": "p"}]}"#,
        );
        let layout = adapt(Mode::AppsOnly, &p);
        assert!(!layout.is_visible(RegionId::InstancesCard));
        assert!(!layout.is_visible(RegionId::Density));
        assert_eq!(layout.title(RegionId::PlansCard), "Unique Plans Referenced");
        assert_eq!(layout.title(RegionId::TierChart), "Top 10 Plans by App Count");
        assert_eq!(layout.title(RegionId::GroupTable), "Top Subscriptions");
        let labels: Vec<_> = layout
            .columns(RegionId::GroupTable)
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Subscription", "Apps"]);
        assert_eq!(layout.columns(RegionId::TierTable).len(), 2);
    }

    #[test]
    fn tier_table_gains_os_column_when_rows_carry_it() {
        let p = payload(
            r#"{"tables": {"tier_stats": [{"Tier": "P1v3", "OS": "Linux", "Plans": 1, "Apps": 2, "Instances": 3}]}}"#,
        );
        let layout = adapt(Mode::PlansOnly, &p);
        let labels: Vec<_> = layout
            .columns(RegionId::TierTable)
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Tier", "OS", "Plans", "Apps", "Instances"]);
    }

    #[test]
    fn adapt_is_independent_of_previous_results() {
        let apps = payload(r#"{"summary": {}, "charts": {"plans": {"labels": []}}}"#);
        let plans = payload(r#"{"summary": {}, "charts": {"tier": {"labels": []}}}"#);
        let _ = adapt(Mode::AppsOnly, &apps);
        let layout = adapt(Mode::PlansOnly, &plans);
        assert!(layout.is_visible(RegionId::InstancesCard));
        assert_eq!(layout.title(RegionId::PlansCard), "Total Plans");
        assert_eq!(adapt(Mode::PlansOnly, &plans), layout);
    }

    #[test]
    fn tier_chart_choice_prefers_mode_series() {
        let charts: Charts = serde_json::from_str(
            r#"{"plans": {"labels": ["p"]}, "tier": {"labels": ["t"]}}"#,
        )
        .unwrap();
        let (kind, series) = tier_chart_choice(Mode::AppsOnly, &charts).unwrap();
        assert_eq!(kind, ChartKind::BarHorizontalTop10);
        assert_eq!(series.labels, vec!["p"]);
        let (kind, _) = tier_chart_choice(Mode::Combined, &charts).unwrap();
        assert_eq!(kind, ChartKind::BarGrouped);
    }

    #[test]
    fn chart_plan_skips_hidden_regions() {
        let p = payload(
            r#"{"charts": {"tier": {"labels": ["F1"]}, "location": {"labels": ["eastus"]}}}"#,
        );
        let layout = adapt(Mode::PlansOnly, &p);
        let plan = chart_plan(Mode::PlansOnly, &p, &layout);
        let regions: Vec<_> = plan.iter().map(|(r, _, _)| *r).collect();
        assert_eq!(regions, vec![RegionId::TierChart, RegionId::LocationChart]);
    }
}
