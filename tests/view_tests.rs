/// Mode classification, layout and chart tests.
///
/// Covers how one payload flows through mode resolution, region layout,
/// chart building and recommendation rendering.
use std::collections::BTreeMap;

use serde_json::{Value, json};

use plansight::charts::{self, ChartKind, ChartRenderer, percentages, truncate_label};
use plansight::client::DataSource;
use plansight::controller::DashboardView;
use plansight::mode::{self, Mode, Signal};
use plansight::payload::{AnalysisPayload, Recommendation, Series};
use plansight::recommendations::{self, NO_ISSUES_NOTICE, RecommendationList};
use plansight::view::{self, RegionId};

fn payload(value: Value) -> AnalysisPayload {
    serde_json::from_value(value).unwrap()
}

fn renderer() -> ChartRenderer {
    ChartRenderer::new(RegionId::CHARTS.map(RegionId::dom_id))
}

// ---------------------------------------------------------------------------
// Mode resolution
// ---------------------------------------------------------------------------

#[test]
fn plans_chart_means_apps_only() {
    let p = payload(json!({
        "combined_insights": { "mode": "combined", "enabled": true },
        "charts": { "plans": { "labels": ["plan-a"], "apps": [3] } },
    }));
    let resolution = mode::classify(&p);
    assert_eq!(resolution.mode, Mode::AppsOnly);
    assert_eq!(resolution.signal, Signal::PlansChart);
    assert_eq!(resolution.conflict, Some(Mode::Combined));
}

#[test]
fn tier_chart_with_enabled_insights_is_combined() {
    let p = payload(json!({
        "combined_insights": { "enabled": true },
        "summary": { "total_plans": 2, "total_apps": 6, "total_instances": 4 },
        "charts": { "tier": { "labels": ["S1"], "plans": [2], "apps": [6], "instances": [4] } },
        "density_metrics": [{ "plan_name": "plan-a", "apps": 6, "instances": 4, "density": 1.5 }],
    }));
    assert_eq!(mode::resolve(&p), Mode::Combined);

    let layout = view::adapt(Mode::Combined, &p);
    assert!(layout.is_visible(RegionId::InstancesCard));
    assert!(layout.is_visible(RegionId::Density));
    assert_eq!(
        layout.title(RegionId::Recommendations),
        "Combined Optimization Recommendations"
    );
}

#[test]
fn missing_everything_falls_back_to_plans_only() {
    let resolution = mode::classify(&AnalysisPayload::default());
    assert_eq!(resolution.mode, Mode::PlansOnly);
    assert_eq!(resolution.signal, Signal::Fallback);
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[test]
fn apps_only_layout() {
    let p = payload(json!({
        "summary": { "total_plans": 4, "total_apps": 9, "total_instances": 0 },
        "charts": { "plans": { "labels": ["plan-a", "plan-b"], "apps": [6, 3] } },
        "tables": { "tier_stats": [{ "Tier": "P1v2", "Apps": 9 }] },
        "density_metrics": [{ "plan_name": "plan-a", "apps": 6, "instances": 2, "density": 3.0 }],
    }));
    let layout = view::adapt(Mode::AppsOnly, &p);

    assert!(!layout.is_visible(RegionId::InstancesCard));
    assert_eq!(layout.title(RegionId::PlansCard), "Unique Plans Referenced");
    assert_eq!(layout.title(RegionId::TierChart), "Top 10 Plans by App Count");
    assert!(!layout.is_visible(RegionId::Density));

    let columns: Vec<&str> = layout
        .columns(RegionId::TierTable)
        .iter()
        .map(|c| c.label.as_str())
        .collect();
    assert_eq!(columns, ["Tier", "Apps"]);
}

#[test]
fn absent_sections_hide_their_regions() {
    let p = payload(json!({ "charts": { "tier": { "labels": ["B1"], "plans": [1] } } }));
    let layout = view::adapt(Mode::PlansOnly, &p);
    assert!(!layout.is_visible(RegionId::PlansCard));
    assert!(!layout.is_visible(RegionId::LocationChart));
    assert!(!layout.is_visible(RegionId::OsChart));
    assert!(!layout.is_visible(RegionId::GroupTable));
    assert!(layout.is_visible(RegionId::TierChart));
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

#[test]
fn share_percentages_sum_to_one_hundred() {
    for values in [
        vec![1.0, 1.0, 1.0],
        vec![7.0, 13.0, 29.0, 1.0],
        vec![2.0, 3.0, 5.0, 11.0, 17.0, 19.0],
    ] {
        let total: f64 = percentages(&values).iter().sum();
        assert!((total - 100.0).abs() <= 0.1 + 1e-9, "{values:?} -> {total}");
    }
    assert_eq!(percentages(&[0.0, 0.0]), vec![0.0, 0.0]);
}

#[test]
fn location_tooltips_carry_percentages() {
    let series = Series {
        labels: vec!["eastus".to_string(), "westeurope".to_string()],
        apps: Some(vec![3.0, 1.0]),
        ..Series::default()
    };
    let (_, tooltips) = charts::build(ChartKind::Donut, &series);
    assert_eq!(
        tooltips.labels.unwrap(),
        vec!["eastus: 3 (75.0%)", "westeurope: 1 (25.0%)"]
    );
}

#[test]
fn long_plan_names_are_truncated() {
    let long = "a".repeat(30);
    let truncated = truncate_label(&long);
    assert_eq!(truncated.chars().count(), 25);
    assert!(truncated.ends_with("..."));

    let short = "b".repeat(20);
    assert_eq!(truncate_label(&short), short);
}

#[test]
fn top10_keeps_full_names_for_tooltips() {
    let long = "plan-with-a-really-long-descriptive-name".to_string();
    let p = payload(json!({ "charts": { "plans": { "labels": [long], "apps": [4] } } }));
    let (_, specs) = DashboardView::compose("app-service", DataSource::Csv, &p, &renderer());
    let spec = specs.iter().find(|s| s.mount == "tierChart").unwrap();
    assert_eq!(spec.kind, ChartKind::BarHorizontalTop10);
    assert_eq!(spec.labels()[0].chars().count(), 25);
    assert_eq!(spec.tooltips.titles.as_ref().unwrap()[0], long);
}

#[test]
fn missing_mount_skips_chart() {
    let p = payload(json!({
        "charts": {
            "tier": { "labels": ["B1"], "plans": [1] },
            "os": { "labels": ["Linux"], "plans": [1] },
        }
    }));
    let only_tier = ChartRenderer::new(["tierChart"]);
    let (_, specs) = DashboardView::compose("app-service", DataSource::Csv, &p, &only_tier);
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].mount, "tierChart");
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

#[test]
fn empty_recommendations_render_one_notice() {
    let list = recommendations::render(&[], &BTreeMap::new());
    assert_eq!(list.element_count(), 1);
    assert_eq!(
        list,
        RecommendationList::Clear {
            notice: NO_ISSUES_NOTICE.to_string()
        }
    );
}

#[test]
fn unknown_recommendation_type_uses_generic_definition() {
    let rec = Recommendation {
        kind: "brand_new_check".to_string(),
        potential_saving: "Low-Medium".to_string(),
        ..Recommendation::default()
    };
    match recommendations::render(&[rec], &BTreeMap::new()) {
        RecommendationList::Items { cards } => {
            assert_eq!(cards[0].title, "Optimization Opportunity");
            assert_eq!(cards[0].category, "General");
            assert_eq!(cards[0].badge, "Low-Medium");
        }
        other => panic!("expected cards, got {other:?}"),
    }
}
