//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `plansight show` — run one render cycle and print the dashboard
//! - `plansight render` — write the dashboard as a standalone HTML file
//! - `plansight serve` — start the local dashboard server
//! - `plansight upload` / `delete` — manage uploaded CSV exports
//! - `plansight export` — save the recommendations export document
//! - `plansight stats` — summarize the render/event log
//! - `plansight health` — check config files and backend reachability
//! - `plansight config show|init|set|reset` — configuration management

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::analytics::EventLog;
use crate::analytics::reporter::{self, Stats};
use crate::client::{BackendClient, DataSource, UploadForm};
use crate::config;
use crate::config::schema::PlansightConfig;
use crate::controller::{ActionOutcome, DashboardViewController, ViewState};
use crate::recommendations::RecommendationList;
use crate::render::{self, PageContext};
use crate::web;

/// Default file name for `plansight export`.
pub const EXPORT_FILE_NAME: &str = "cost-optimization-recommendations.json";

/// Output format for reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Resource type and data source for one dashboard, falling back to config.
#[derive(Debug, Clone)]
pub struct Target {
    pub resource_type: String,
    pub source: DataSource,
}

impl Target {
    pub fn resolve(
        config: &PlansightConfig,
        resource_type: Option<String>,
        source: Option<&str>,
    ) -> Result<Self> {
        let source = match source {
            None => config.dashboard.source,
            Some(s) => DataSource::parse(s)
                .with_context(|| format!("unknown data source '{s}' (expected csv or json)"))?,
        };
        Ok(Self {
            resource_type: resource_type.unwrap_or_else(|| config.dashboard.resource_type.clone()),
            source,
        })
    }
}

fn controller(config: &PlansightConfig, target: &Target) -> DashboardViewController<BackendClient> {
    DashboardViewController::new(
        BackendClient::from_config(config),
        target.resource_type.clone(),
        target.source,
    )
    .with_reload_delay(std::time::Duration::from_millis(
        config.dashboard.reload_delay_ms,
    ))
    .with_log(EventLog::from_config(config))
}

// ---------------------------------------------------------------------------
// plansight show
// ---------------------------------------------------------------------------

/// Run one render cycle and print the result.
pub fn run_show(config: &PlansightConfig, target: &Target, format: OutputFormat) -> Result<()> {
    let mut controller = controller(config, target);
    controller.load();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
        }
        OutputFormat::Csv => print_recommendations_csv(controller.state()),
        OutputFormat::Table => {
            print!("{}", render::render_report(controller.state(), controller.charts()));
        }
    }
    Ok(())
}

/// Quote a CSV field when it needs it.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn print_recommendations_csv(state: &ViewState) {
    println!("severity,title,category,resource,current_state,suggestion");
    let Some(RecommendationList::Items { cards }) = (match state {
        ViewState::Ready(view) => view.recommendations.as_ref(),
        _ => None,
    }) else {
        return;
    };
    for card in cards {
        println!(
            "{},{},{},{},{},{}",
            card.severity,
            csv_field(&card.title),
            csv_field(&card.category),
            csv_field(&card.resource),
            csv_field(&card.current_state),
            csv_field(&card.suggestion)
        );
    }
}

// ---------------------------------------------------------------------------
// plansight render
// ---------------------------------------------------------------------------

/// Write the dashboard as a standalone HTML page.
pub fn run_render(config: &PlansightConfig, target: &Target, out: Option<PathBuf>) -> Result<()> {
    let mut controller = controller(config, target);
    controller.load();

    let ctx = PageContext {
        resource_type: target.resource_type.clone(),
        source: target.source,
        reload_delay_ms: config.dashboard.reload_delay_ms,
        interactive: false,
    };
    let html = render::render_page(controller.state(), controller.charts(), &ctx);
    let out = out.unwrap_or_else(|| PathBuf::from(format!("plansight-{}.html", target.resource_type)));
    fs::write(&out, html).with_context(|| format!("failed to write {}", out.display()))?;

    let status = match controller.state() {
        ViewState::Ready(_) => "✓".green().bold(),
        _ => "✗".yellow().bold(),
    };
    println!(
        "{} Dashboard written to {} {}",
        status,
        out.display(),
        format!("({} charts)", controller.charts().len()).dimmed()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// plansight serve
// ---------------------------------------------------------------------------

/// Start the dashboard server. Blocks until interrupted.
pub fn run_serve(mut config: PlansightConfig, addr: Option<String>, no_browser: bool) -> Result<()> {
    if let Some(addr) = addr {
        config.web.addr = addr;
    }
    if no_browser {
        config.web.open_browser = false;
    }
    web::serve(config)
}

// ---------------------------------------------------------------------------
// plansight upload | delete | export
// ---------------------------------------------------------------------------

/// Build the upload form from the command-line file options.
///
/// `--file` paths go into a numbered multi-file form; otherwise the
/// standard plans/apps pair is used.
pub fn upload_form(plans: Option<PathBuf>, apps: Option<PathBuf>, files: Vec<PathBuf>) -> UploadForm {
    if files.is_empty() {
        UploadForm::plans_and_apps(plans, apps)
    } else {
        UploadForm::multi(
            files
                .into_iter()
                .enumerate()
                .map(|(i, path)| (format!("File {}", i + 1), Some(path), false)),
        )
    }
}

fn report_action(controller: &mut DashboardViewController<BackendClient>, outcome: ActionOutcome, wait: bool) -> Result<()> {
    match outcome {
        ActionOutcome::Succeeded { message, detail, .. } => {
            println!("{} {}", "✓".green().bold(), message);
            if let Some(detail) = detail {
                println!("  {}", detail.dimmed());
            }
            if wait && controller.wait_for_reload() {
                print!("{}", render::render_report(controller.state(), controller.charts()));
            }
            Ok(())
        }
        ActionOutcome::Failed { message } => bail!(message),
    }
}

/// Upload CSV exports. With `wait`, re-run the analysis once the reload
/// delay has passed and print it.
pub fn run_upload(config: &PlansightConfig, target: &Target, form: &UploadForm, wait: bool) -> Result<()> {
    let mut controller = controller(config, target);
    let outcome = controller.upload(form);
    report_action(&mut controller, outcome, wait)
}

/// Delete every uploaded file for the resource type.
pub fn run_delete(config: &PlansightConfig, target: &Target, yes: bool, wait: bool) -> Result<()> {
    if !yes && !confirm(&format!(
        "Delete all uploaded files for {}?",
        target.resource_type
    ))? {
        println!("{}", "Cancelled.".dimmed());
        return Ok(());
    }
    let mut controller = controller(config, target);
    let outcome = controller.delete_uploads();
    report_action(&mut controller, outcome, wait)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Save the recommendations export document as pretty-printed JSON.
pub fn run_export(config: &PlansightConfig, target: &Target, out: Option<PathBuf>) -> Result<()> {
    let controller = controller(config, target);
    let doc = controller.export().context("failed to export recommendations")?;
    let out = out.unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME));
    write_pretty_json(&out, &doc)?;
    println!("{} Recommendations exported to {}", "✓".green().bold(), out.display());
    Ok(())
}

fn write_pretty_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

// ---------------------------------------------------------------------------
// plansight stats
// ---------------------------------------------------------------------------

/// Summarize the event log.
pub fn run_stats(config: &PlansightConfig, format: OutputFormat, days: Option<u32>) -> Result<()> {
    let stats = reporter::compute_stats(&EventLog::from_config(config), days);

    if stats.total_events == 0 {
        println!(
            "{}",
            "No events yet. Run `plansight show` or `plansight serve` to record some.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Csv => print_stats_csv(&stats),
        OutputFormat::Table => print_stats_table(&stats),
    }
    Ok(())
}

fn print_stats_table(stats: &Stats) {
    println!("{}", "plansight Event Report".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();
    println!("  {} {}", "Total events:  ".bold(), stats.total_events);
    println!(
        "  {} {} ({:.1}% reached the dashboard)",
        "Render cycles: ".bold(),
        stats.renders,
        stats.render_success_pct()
    );
    println!("  {} {}", "Actions:       ".bold(), stats.actions);
    println!();

    println!("{}", "Outcomes".bold().cyan());
    for (outcome, count) in &stats.outcomes {
        println!("  {:<16} {:>6}", outcome, count);
    }
    println!();

    if !stats.modes.is_empty() {
        println!("{}", "Analysis Modes".bold().cyan());
        for (mode, count) in &stats.modes {
            println!("  {:<16} {:>6}", mode, count);
        }
        println!();
    }

    println!("{}", "Resource Types".bold().cyan());
    println!(
        "  {:<20} {:>8} {:>6} {:>7} {:>8} {:>8}  {}",
        "Resource", "Renders", "Ready", "Failed", "Uploads", "Deletes", "Last mode"
    );
    println!("  {}", "-".repeat(76));
    for r in &stats.resources {
        let line = format!(
            "  {:<20} {:>8} {:>6} {:>7} {:>8} {:>8}  {}",
            r.resource_type,
            r.renders,
            r.ready,
            r.failed,
            r.uploads,
            r.deletes,
            r.last_mode.as_deref().unwrap_or("-")
        );
        if r.failed > r.ready {
            println!("{}", line.yellow());
        } else {
            println!("{line}");
        }
    }
}

fn print_stats_csv(stats: &Stats) {
    println!("resource_type,renders,ready,failed,uploads,deletes,last_mode");
    for r in &stats.resources {
        println!(
            "{},{},{},{},{},{},{}",
            csv_field(&r.resource_type),
            r.renders,
            r.ready,
            r.failed,
            r.uploads,
            r.deletes,
            r.last_mode.as_deref().unwrap_or("")
        );
    }
}

// ---------------------------------------------------------------------------
// plansight health
// ---------------------------------------------------------------------------

/// Check config files, the event log and backend reachability.
pub fn run_health(config: &PlansightConfig) -> Result<()> {
    println!("{}", "plansight Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.plansight/config.toml found"
        } else {
            "not found (run `plansight config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".plansight.toml found"
        } else {
            "none (optional)"
        },
    );
    print_health_item(
        "Dashboard",
        true,
        &format!(
            "{} / {}",
            config.dashboard.resource_type, config.dashboard.source
        ),
    );

    let client = BackendClient::from_config(config);
    let reachable = client.is_reachable();
    print_health_item(
        "Backend",
        reachable,
        &if reachable {
            format!("reachable at {}", client.base_url())
        } else {
            format!("not reachable at {}; is the backend running?", client.base_url())
        },
    );

    let log = EventLog::from_config(config);
    match log.path() {
        None => print_health_item("Event log", false, "disabled"),
        Some(path) if path.exists() => print_health_item(
            "Event log",
            true,
            &format!("{} events", log.read_all().len()),
        ),
        Some(_) => print_health_item("Event log", false, "no log file yet"),
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// plansight config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective plansight Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    for (exists, name) in [
        (global_exists, "~/.plansight/config.toml"),
        (project_exists, ".plansight.toml"),
    ] {
        if exists {
            println!("  {} {}", "✓".green(), name.dimmed());
        } else {
            println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
        }
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "PLANSIGHT_* environment variables".dimmed()
    );
    Ok(())
}

/// Initialize a default config file at `~/.plansight/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} Config written to {}", "✓".green().bold(), path.display());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_str_opt(Some("table")), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
    }

    #[test]
    fn target_falls_back_to_config() {
        let config = PlansightConfig::default();
        let target = Target::resolve(&config, None, None).unwrap();
        assert_eq!(target.resource_type, "app-service");
        assert_eq!(target.source, DataSource::Csv);

        let target = Target::resolve(&config, Some("functions".to_string()), Some("json")).unwrap();
        assert_eq!(target.resource_type, "functions");
        assert_eq!(target.source, DataSource::Json);
    }

    #[test]
    fn target_rejects_unknown_source() {
        let config = PlansightConfig::default();
        assert!(Target::resolve(&config, None, Some("xml")).is_err());
    }

    #[test]
    fn upload_form_from_options() {
        let form = upload_form(Some(PathBuf::from("plans.csv")), None, Vec::new());
        assert_eq!(form.fields().len(), 2);
        assert!(form.fields().iter().all(|f| !f.required));
        assert!(form.validate().is_ok());

        let form = upload_form(None, Some(PathBuf::from("apps.csv")), Vec::new());
        let sent = form.validate().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].name, "file1");

        let form = upload_form(None, None, vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]);
        assert_eq!(form.fields()[1].name, "file1");
        assert_eq!(form.fields()[1].label, "File 2");
    }

    #[test]
    fn csv_field_quotes_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn write_pretty_json_indents() {
        let path = std::env::temp_dir().join(format!(
            "plansight_export_{}.json",
            std::process::id()
        ));
        write_pretty_json(&path, &serde_json::json!({"recommendations": []})).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"recommendations\""));
        let _ = fs::remove_file(&path);
    }
}
