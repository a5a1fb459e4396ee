use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use plansight::cli::{self, OutputFormat, Target};
use plansight::config;

#[derive(Debug, Parser)]
#[command(name = "plansight")]
#[command(about = "App Service cost-optimization dashboard")]
#[command(version)]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the analysis and print the dashboard to the terminal
    Show {
        /// Resource type to analyze (default from config)
        resource_type: Option<String>,
        /// Data source: csv (uploaded files) or json (Azure scan)
        #[arg(long)]
        source: Option<String>,
        /// Output format: table (default), json, csv (recommendations)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Write the dashboard as a standalone HTML file
    Render {
        resource_type: Option<String>,
        #[arg(long)]
        source: Option<String>,
        /// Output path (default: plansight-<resource-type>.html)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Start the local dashboard server
    Serve {
        /// Listen address (default from config)
        #[arg(long)]
        addr: Option<String>,
        /// Don't open a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Upload CSV exports for analysis
    Upload {
        resource_type: Option<String>,
        /// App Service Plans CSV
        #[arg(long)]
        plans: Option<PathBuf>,
        /// App Services CSV; either file may be uploaded alone
        #[arg(long)]
        apps: Option<PathBuf>,
        /// Generic file field; repeat for several files
        #[arg(long = "file")]
        files: Vec<PathBuf>,
        /// Wait for the reload and print the refreshed analysis
        #[arg(long)]
        wait: bool,
    },
    /// Delete all uploaded files for a resource type
    Delete {
        resource_type: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Wait for the reload and print the refreshed analysis
        #[arg(long)]
        wait: bool,
    },
    /// Save the recommendations export document
    Export {
        /// Output path (default: cost-optimization-recommendations.json)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Summarize recorded render cycles and actions
    Stats {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
    },
    /// Check config files and backend reachability
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value, e.g. `backend.base_url http://127.0.0.1:5000`
    Set { key: String, value: String },
    /// Reset the config file to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();

    match app.command {
        Commands::Show {
            resource_type,
            source,
            format,
        } => {
            let target = Target::resolve(&cfg, resource_type, source.as_deref())?;
            cli::run_show(&cfg, &target, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Render {
            resource_type,
            source,
            out,
        } => {
            let target = Target::resolve(&cfg, resource_type, source.as_deref())?;
            cli::run_render(&cfg, &target, out)
        }
        Commands::Serve { addr, no_browser } => cli::run_serve(cfg, addr, no_browser),
        Commands::Upload {
            resource_type,
            plans,
            apps,
            files,
            wait,
        } => {
            let target = Target::resolve(&cfg, resource_type, None)?;
            let form = cli::upload_form(plans, apps, files);
            cli::run_upload(&cfg, &target, &form, wait)
        }
        Commands::Delete {
            resource_type,
            yes,
            wait,
        } => {
            let target = Target::resolve(&cfg, resource_type, None)?;
            cli::run_delete(&cfg, &target, yes, wait)
        }
        Commands::Export { out } => {
            let target = Target::resolve(&cfg, None, None)?;
            cli::run_export(&cfg, &target, out)
        }
        Commands::Stats { format, days } => {
            cli::run_stats(&cfg, OutputFormat::from_str_opt(Some(&format)), days)
        }
        Commands::Health => cli::run_health(&cfg),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
