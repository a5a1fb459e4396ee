//! Colored terminal report for `plansight show`.

use colored::Colorize;

use crate::charts::{ChartRegistry, ChartSpec};
use crate::controller::{DashboardView, ErrorPanel, PanelKind, ViewState};
use crate::payload::Severity;
use crate::recommendations::RecommendationList;
use crate::view::tables::Row;
use crate::view::{Layout, RegionId};

const RULE_WIDTH: usize = 60;
const COLUMN_WIDTH: usize = 14;

/// Render a dashboard state as terminal text.
pub fn render_report(state: &ViewState, charts: &ChartRegistry) -> String {
    match state {
        ViewState::Loading => format!("{}\n", "Loading analysis...".dimmed()),
        ViewState::Ready(view) => report_view(view, charts),
        ViewState::Failed(panel) => report_panel(panel),
    }
}

fn heading(out: &mut Vec<String>, title: &str) {
    out.push(String::new());
    out.push(format!("{}", title.bold().cyan()));
}

fn report_view(view: &DashboardView, charts: &ChartRegistry) -> String {
    let layout = &view.layout;
    let mut out = vec![
        format!(
            "{} {} {}",
            "plansight".bold().cyan(),
            view.resource_type.bold(),
            format!("(source: {}, mode: {})", view.source, view.resolution.mode).dimmed()
        ),
        "=".repeat(RULE_WIDTH),
    ];

    if let Some(banner) = &view.source_banner {
        out.push(format!(
            "  {} {} {}",
            banner.heading.bold(),
            banner.scan_file,
            format!("scanned {}", banner.scanned).dimmed()
        ));
    }
    if let Some(banner) = &view.mode_banner {
        out.push(format!(
            "  {} [{}] {}",
            banner.heading.bold(),
            banner.badge,
            banner.body.dimmed()
        ));
    }
    if let Some(conflict) = view.resolution.conflict {
        out.push(format!(
            "  {} insights metadata says {}, charts say {}",
            "!".yellow().bold(),
            conflict,
            view.resolution.mode
        ));
    }

    if !view.summary.is_empty() {
        heading(&mut out, "Summary");
        for card in &view.summary {
            out.push(format!("  {:<28} {}", card.title, card.value.bold()));
        }
    }

    if layout.is_visible(RegionId::Recommendations)
        && let Some(list) = &view.recommendations
    {
        heading(
            &mut out,
            &format!("{} ({})", layout.title(RegionId::Recommendations), list.count()),
        );
        report_recommendations(&mut out, list);
    }

    let visible_charts: Vec<(RegionId, &ChartSpec)> = RegionId::CHARTS
        .iter()
        .filter(|region| layout.is_visible(**region))
        .filter_map(|region| charts.get(region.dom_id()).map(|spec| (*region, spec)))
        .collect();
    if !visible_charts.is_empty() {
        heading(&mut out, "Charts");
        for (region, spec) in visible_charts {
            out.push(format!("  {}", layout.title(region).bold()));
            out.push(format!("    {}", spec.labels().join(", ").dimmed()));
        }
    }

    for region in [RegionId::TierTable, RegionId::GroupTable] {
        if layout.is_visible(region) {
            let rows = if region == RegionId::TierTable {
                &view.tier_rows
            } else {
                &view.group_rows
            };
            heading(&mut out, layout.title(region));
            report_table(&mut out, layout, region, rows);
        }
    }

    if layout.is_visible(RegionId::Density) {
        heading(&mut out, layout.title(RegionId::Density));
        for card in &view.density {
            let status = match card.color.as_str() {
                "danger" => card.status.red(),
                "warning" => card.status.yellow(),
                "success" => card.status.green(),
                _ => card.status.normal(),
            };
            out.push(format!(
                "  {:<30} {:<8} {:>5} apps {:>5} inst {:>6}  {}",
                card.plan_name, card.tier, card.apps, card.instances, card.density, status
            ));
        }
    }

    out.push(String::new());
    out.join("\n")
}

fn report_recommendations(out: &mut Vec<String>, list: &RecommendationList) {
    match list {
        RecommendationList::Clear { notice } => {
            out.push(format!("  {} {}", "✓".green().bold(), notice));
        }
        RecommendationList::Items { cards } => {
            for card in cards {
                let badge = match card.severity {
                    Severity::High => card.badge.red().bold(),
                    Severity::Medium => card.badge.yellow().bold(),
                    Severity::Low => card.badge.cyan(),
                };
                out.push(format!(
                    "  [{}] {} {}",
                    badge,
                    card.title.bold(),
                    format!("({})", card.category).dimmed()
                ));
                out.push(format!("      {}", card.resource));
                out.push(format!(
                    "      {} {} {}",
                    card.current_state.dimmed(),
                    "->".dimmed(),
                    card.suggestion
                ));
            }
        }
    }
}

fn report_table(out: &mut Vec<String>, layout: &Layout, region: RegionId, rows: &[Row]) {
    let head: String = layout
        .columns(region)
        .iter()
        .map(|col| format!("{:<COLUMN_WIDTH$}", col.label))
        .collect();
    out.push(format!("  {}", head.trim_end().bold()));
    out.push(format!("  {}", "-".repeat(RULE_WIDTH - 2)));
    for row in rows {
        let line: String = row
            .iter()
            .map(|cell| {
                let width = COLUMN_WIDTH * usize::from(cell.colspan.max(1));
                format!("{:<width$}", cell.text)
            })
            .collect();
        let line = line.trim_end().to_string();
        if row.iter().any(|cell| cell.muted) {
            out.push(format!("  {}", line.dimmed()));
        } else {
            out.push(format!("  {line}"));
        }
    }
}

fn report_panel(panel: &ErrorPanel) -> String {
    let mark = match panel.kind {
        PanelKind::NoData | PanelKind::NotImplemented => "·".yellow().bold(),
        PanelKind::MissingFile | PanelKind::Failed => "✗".red().bold(),
    };
    let mut out = vec![format!("{} {}", mark, panel.heading.bold()), format!("  {}", panel.message)];
    if let Some(note) = &panel.note {
        out.push(format!("  {}", note.dimmed()));
    }
    if let Some(source) = panel.source {
        out.push(format!("  {} {}", "Current data source:".dimmed(), source));
    }
    if let Some(url) = &panel.url {
        out.push(format!("  {} {}", "API URL:".dimmed(), url));
    }
    let hints: Vec<&str> = panel.actions.iter().map(|a| a.label()).collect();
    if !hints.is_empty() {
        out.push(format!("  {} {}", "Next:".dimmed(), hints.join(" | ")));
    }
    out.push(String::new());
    out.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartRenderer;
    use crate::client::{DataSource, FetchError};
    use crate::payload::AnalysisPayload;

    fn ready(json: &str) -> (ViewState, ChartRegistry) {
        let payload = AnalysisPayload::from_json(json).unwrap();
        let renderer = ChartRenderer::new(RegionId::CHARTS.map(RegionId::dom_id));
        let (view, specs) =
            DashboardView::compose("app-service", DataSource::Csv, &payload, &renderer);
        let mut registry = ChartRegistry::new();
        registry.replace_all(specs);
        (ViewState::Ready(Box::new(view)), registry)
    }

    #[test]
    fn report_lists_summary_and_recommendations() {
        let (state, charts) = ready(
            r#"{"summary": {"total_plans": 5, "total_apps": 12, "total_instances": 20},
                "recommendations": [{"type": "consolidate", "resource": "plan-a",
                    "current_state": "1 app", "suggestion": "merge", "potential_saving": "High"}],
                "charts": {"tier": {"labels": ["B1", "S1"], "plans": [2, 3], "apps": [4, 8], "instances": [5, 15]}}}"#,
        );
        let text = render_report(&state, &charts);
        assert!(text.contains("Total Plans"));
        assert!(text.contains("Optimization Opportunity"));
        assert!(text.contains("plan-a"));
        assert!(text.contains("B1, S1"));
    }

    #[test]
    fn report_shows_no_issues_notice() {
        let (state, charts) = ready(r#"{"recommendations": []}"#);
        let text = render_report(&state, &charts);
        assert!(text.contains(crate::recommendations::NO_ISSUES_NOTICE));
    }

    #[test]
    fn panel_report_names_next_steps() {
        let panel = ErrorPanel::from_fetch_error(
            &FetchError::MissingRequiredFile {
                message: "App Service Plans CSV is required".to_string(),
            },
            "app-service",
            DataSource::Csv,
        );
        let text = render_report(&ViewState::Failed(panel), &ChartRegistry::new());
        assert!(text.contains("Missing Required File"));
        assert!(text.contains("App Service Plans CSV is required"));
        assert!(text.contains("Clear & Upload Correct Files"));
    }
}
