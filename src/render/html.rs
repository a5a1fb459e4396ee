//! Self-contained HTML rendering of a dashboard state.
//!
//! Hidden regions are left out of the document entirely. Chart
//! configurations travel in a JSON data block next to their precomputed
//! tooltip text; the embedded script hands them to Chart.js.

use serde_json::json;

use super::assets::{CHART_JS_URL, SCRIPT, STYLE};
use crate::charts::ChartRegistry;
use crate::client::{DataSource, UploadForm};
use crate::controller::{DashboardView, ErrorPanel, PanelAction, PanelKind, ViewState};
use crate::recommendations::RecommendationList;
use crate::view::tables::{Cell, Row};
use crate::view::{Layout, RegionId};

/// Page-level settings that don't come from the payload.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub resource_type: String,
    pub source: DataSource,
    pub reload_delay_ms: u64,
    /// Include upload, delete and export controls. Off for static exports,
    /// where there is no server to post to.
    pub interactive: bool,
}

/// Render the full page for a dashboard state.
pub fn render_page(state: &ViewState, charts: &ChartRegistry, ctx: &PageContext) -> String {
    let body = match state {
        ViewState::Loading => "<p class=\"subtitle\">Loading analysis...</p>".to_string(),
        ViewState::Ready(view) => render_view(view, ctx),
        ViewState::Failed(panel) => render_panel(panel, ctx),
    };

    let data = json!({
        "resourceType": ctx.resource_type,
        "source": ctx.source,
        "reloadDelayMs": ctx.reload_delay_ms,
        "charts": charts.iter().collect::<Vec<_>>(),
    });

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>plansight: {title}</title>
<style>{STYLE}</style>
</head>
<body>
<div class="app">
{header}
<div id="actionMessage"></div>
<main id="mainContent">
{body}
</main>
{upload}
</div>
<script type="application/json" id="plansight-data">{data}</script>
<script src="{CHART_JS_URL}"></script>
<script>{SCRIPT}</script>
</body>
</html>
"#,
        title = escape_html(&ctx.resource_type),
        header = render_header(ctx),
        upload = if ctx.interactive {
            render_upload_form()
        } else {
            String::new()
        },
        data = script_json(&data),
    )
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize JSON for embedding inside a `<script>` element.
fn script_json(value: &serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}

// ---------------------------------------------------------------------------
// Header and forms
// ---------------------------------------------------------------------------

fn render_header(ctx: &PageContext) -> String {
    let source_button = |source: DataSource, label: &str| {
        let class = if source == ctx.source { " class=\"active\"" } else { "" };
        format!(r#"<button type="button" data-source="{source}"{class}>{label}</button>"#)
    };

    let mut toolbar = vec![
        source_button(DataSource::Csv, "Uploaded CSV"),
        source_button(DataSource::Json, "Azure Scan"),
    ];
    if ctx.interactive {
        toolbar.push(r##"<a class="button" href="#upload">Upload</a>"##.to_string());
        toolbar.push(
            r#"<button type="button" class="danger" data-action="delete">Delete uploads</button>"#
                .to_string(),
        );
    }

    format!(
        r#"<header>
<div><h1><span class="logo">plansight</span> {resource}</h1>
<div class="subtitle">App Service cost optimization</div></div>
<div class="toolbar">{toolbar}</div>
</header>"#,
        resource = escape_html(&ctx.resource_type),
        toolbar = toolbar.join(""),
    )
}

fn render_upload_form() -> String {
    let form = UploadForm::plans_and_apps(None, None);
    let any_required = form.fields().iter().any(|f| f.required);
    let inputs: String = form
        .fields()
        .iter()
        .map(|field| {
            let suffix = if any_required && !field.required { " (optional)" } else { "" };
            format!(
                r#"<div><label for="{name}">{label}{suffix}</label><input type="file" id="{name}" name="{name}" accept=".csv" data-required="{required}" data-label="{label}"></div>"#,
                name = escape_html(&field.name),
                label = escape_html(&field.label),
                required = field.required,
            )
        })
        .collect();

    format!(
        r#"<section class="card" id="upload">
<h2>Upload CSV Files</h2>
<form id="uploadForm" class="upload-form">{inputs}<button type="submit">Upload &amp; Analyze</button></form>
</section>"#
    )
}

// ---------------------------------------------------------------------------
// Error panels
// ---------------------------------------------------------------------------

fn render_panel(panel: &ErrorPanel, ctx: &PageContext) -> String {
    let tone = match panel.kind {
        PanelKind::NoData => "info",
        PanelKind::MissingFile | PanelKind::NotImplemented => "warning",
        PanelKind::Failed => "danger",
    };

    let mut body = format!("<p>{}</p>", escape_html(&panel.message));
    if let Some(note) = &panel.note {
        body.push_str(&format!("<p>{}</p>", escape_html(note)));
    }
    if let Some(source) = panel.source {
        body.push_str(&format!(
            "<p>Current data source: <strong>{source}</strong></p>"
        ));
    }
    if let Some(url) = &panel.url {
        body.push_str(&format!("<p>API URL: <strong>{}</strong></p>", escape_html(url)));
    }

    let actions: String = panel
        .actions
        .iter()
        .filter_map(|action| panel_action(*action, ctx))
        .collect();

    format!(
        r#"<div class="banner {tone}" id="errorPanel" data-kind="{kind}">
<div class="body"><h2>{heading}</h2>{body}<div class="toolbar">{actions}</div></div>
</div>"#,
        kind = serde_json::to_value(panel.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default(),
        heading = escape_html(&panel.heading),
    )
}

fn panel_action(action: PanelAction, ctx: &PageContext) -> Option<String> {
    let label = action.label();
    match action {
        PanelAction::BackHome => Some(format!(r#"<a class="button" href="/">{label}</a>"#)),
        PanelAction::ReloadPage => Some(format!(
            r#"<button type="button" data-action="reload">{label}</button>"#
        )),
        // Both need the server; a static page can't upload or delete.
        PanelAction::UploadFiles if ctx.interactive => Some(format!(
            r##"<a class="button" href="#upload">{label}</a>"##
        )),
        PanelAction::ClearAndReupload if ctx.interactive => Some(format!(
            r#"<button type="button" class="danger" data-action="delete">{label}</button>"#
        )),
        PanelAction::UploadFiles | PanelAction::ClearAndReupload => None,
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

fn render_view(view: &DashboardView, ctx: &PageContext) -> String {
    let layout = &view.layout;
    let mut html = String::new();

    if let Some(banner) = &view.source_banner {
        html.push_str(&format!(
            r#"<div class="banner info" id="dataSourceBanner"><div class="body"><strong>{}</strong>
<p>Loaded from: <code>{}</code> | Scanned: {}</p></div></div>"#,
            escape_html(&banner.heading),
            escape_html(&banner.scan_file),
            escape_html(&banner.scanned),
        ));
    }

    if let Some(banner) = &view.mode_banner {
        html.push_str(&format!(
            r#"<div class="banner {tone}" id="modeBanner"><div class="body"><strong>{heading}</strong>
<p>{body}</p></div><span class="badge">{badge}</span></div>"#,
            tone = banner.tone.as_str(),
            heading = escape_html(&banner.heading),
            body = escape_html(&banner.body),
            badge = escape_html(&banner.badge),
        ));
    }

    if !view.summary.is_empty() {
        html.push_str("<div class=\"stats-grid\">");
        for card in &view.summary {
            html.push_str(&format!(
                r#"<div class="stat-card"><div class="value" id="{id}">{value}</div><div class="label">{title}</div></div>"#,
                id = card.region.dom_id(),
                value = escape_html(&card.value),
                title = escape_html(&card.title),
            ));
        }
        html.push_str("</div>");
    }

    if layout.is_visible(RegionId::Recommendations)
        && let Some(list) = &view.recommendations
    {
        html.push_str(&render_recommendations(layout, list, ctx));
    }

    let chart_cards: String = RegionId::CHARTS
        .iter()
        .filter(|region| layout.is_visible(**region))
        .map(|region| {
            format!(
                r#"<section class="card"><h2>{}</h2><canvas id="{}"></canvas></section>"#,
                escape_html(layout.title(*region)),
                region.dom_id(),
            )
        })
        .collect();
    if !chart_cards.is_empty() {
        html.push_str(&format!("<div class=\"grid-2\">{chart_cards}</div>"));
    }

    let mut tables = String::new();
    if layout.is_visible(RegionId::TierTable) {
        tables.push_str(&render_table(layout, RegionId::TierTable, &view.tier_rows));
    }
    if layout.is_visible(RegionId::GroupTable) {
        tables.push_str(&render_table(layout, RegionId::GroupTable, &view.group_rows));
    }
    if !tables.is_empty() {
        html.push_str(&format!("<div class=\"grid-2\">{tables}</div>"));
    }

    if layout.is_visible(RegionId::Density) {
        html.push_str(&format!(
            r#"<section class="card"><h2>{}</h2><div id="{}">"#,
            escape_html(layout.title(RegionId::Density)),
            RegionId::Density.dom_id(),
        ));
        for card in &view.density {
            html.push_str(&format!(
                r#"<div class="density-card"><div><strong>{plan}</strong><br><small>{tier}</small></div><div><span class="badge">{apps} Apps</span></div><div><span class="badge">{instances} Instances</span></div><div><strong class="text-{color}">{density}</strong><br><small>Apps/Instance</small></div><div><span class="badge text-{color}">{status}</span></div></div>"#,
                plan = escape_html(&card.plan_name),
                tier = escape_html(&card.tier),
                apps = escape_html(&card.apps),
                instances = escape_html(&card.instances),
                density = escape_html(&card.density),
                status = escape_html(&card.status),
                color = card.color,
            ));
        }
        html.push_str("</div></section>");
    }

    html
}

fn render_recommendations(layout: &Layout, list: &RecommendationList, ctx: &PageContext) -> String {
    let export = if ctx.interactive {
        r#" <button type="button" data-action="export">Export</button>"#
    } else {
        ""
    };

    let items = match list {
        RecommendationList::Clear { notice } => {
            format!(r#"<div class="banner success">{}</div>"#, escape_html(notice))
        }
        RecommendationList::Items { cards } => cards
            .iter()
            .map(|card| {
                format!(
                    r#"<div class="recommendation" data-severity="{severity}">
<h3>{title}</h3><span class="badge severity" style="background: {gradient};">{badge}</span> <span class="badge">{category}</span>
<p class="description">{description}</p>
<dl><div><dt>Resource:</dt><dd>{resource}</dd></div><div><dt>Current State:</dt><dd>{current}</dd></div><div><dt>Suggestion:</dt><dd>{suggestion}</dd></div></dl>
</div>"#,
                    severity = card.severity,
                    gradient = card.severity.badge_gradient(),
                    title = escape_html(&card.title),
                    badge = escape_html(&card.badge),
                    category = escape_html(&card.category),
                    description = escape_html(&card.description),
                    resource = escape_html(&card.resource),
                    current = escape_html(&card.current_state),
                    suggestion = escape_html(&card.suggestion),
                )
            })
            .collect(),
    };

    format!(
        r#"<section class="card"><h2>{title} <span class="badge" id="recommendationCount">{count}</span>{export}</h2><div id="{id}">{items}</div></section>"#,
        title = escape_html(layout.title(RegionId::Recommendations)),
        count = list.count(),
        id = RegionId::Recommendations.dom_id(),
    )
}

fn render_table(layout: &Layout, region: RegionId, rows: &[Row]) -> String {
    let head: String = layout
        .columns(region)
        .iter()
        .map(|col| {
            let class = if col.numeric { " class=\"num\"" } else { "" };
            format!("<th{class}>{}</th>", escape_html(&col.label))
        })
        .collect();
    let body: String = rows
        .iter()
        .map(|row| format!("<tr>{}</tr>", row.iter().map(render_cell).collect::<String>()))
        .collect();

    format!(
        r#"<section class="card"><h2>{title}</h2><table><thead><tr>{head}</tr></thead><tbody id="{id}">{body}</tbody></table></section>"#,
        title = escape_html(layout.title(region)),
        id = region.dom_id(),
    )
}

fn render_cell(cell: &Cell) -> String {
    let class = if cell.muted {
        " class=\"muted\""
    } else if cell.numeric {
        " class=\"num\""
    } else {
        ""
    };
    let colspan = if cell.colspan > 1 {
        format!(" colspan=\"{}\"", cell.colspan)
    } else {
        String::new()
    };
    let text = escape_html(&cell.text);
    let text = if cell.strong {
        format!("<strong>{text}</strong>")
    } else {
        text
    };
    format!("<td{class}{colspan}>{text}</td>")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
