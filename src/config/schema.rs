//! Configuration schema and defaults for plansight.
//!
//! Sections: `[backend]`, `[dashboard]`, `[web]` and `[logging]`. Every field
//! has a built-in default; config files only need the values they change.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::client::DataSource;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level plansight configuration.
///
/// Maps directly to `~/.plansight/config.toml` and `.plansight.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlansightConfig {
    pub backend: BackendConfig,
    pub dashboard: DashboardConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Where the analysis backend lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Resource type analyzed when none is given on the command line.
    pub resource_type: String,
    /// Initial data source: `csv` or `json`.
    pub source: DataSource,
    /// Delay between a successful upload/delete and the forced reload.
    pub reload_delay_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            resource_type: "app-service".to_string(),
            source: DataSource::Csv,
            reload_delay_ms: 1500,
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub addr: String,
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8710".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether render cycles and actions are logged.
    pub enabled: bool,
    /// Path to the event log. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.plansight/events.jsonl".to_string(),
        }
    }
}

impl LoggingConfig {
    /// The event log path with `~` expanded, or `None` when logging is off
    /// or the home directory is unknown.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        expand_home(&self.path)
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl PlansightConfig {
    /// Contents written by `plansight config init`.
    pub fn default_toml() -> String {
        r#"# plansight configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (PLANSIGHT_*)
#   2. Project config (.plansight.toml in current directory)
#   3. User global config (~/.plansight/config.toml)
#   4. Built-in defaults

[backend]
base_url = "http://127.0.0.1:5000"   # PLANSIGHT_BACKEND_URL
timeout_ms = 10000                   # PLANSIGHT_TIMEOUT_MS

[dashboard]
resource_type = "app-service"        # PLANSIGHT_RESOURCE_TYPE
source = "csv"                       # csv | json, PLANSIGHT_SOURCE
reload_delay_ms = 1500               # PLANSIGHT_RELOAD_DELAY_MS

[web]
addr = "127.0.0.1:8710"
open_browser = true

[logging]
enabled = true                       # PLANSIGHT_LOG
path = "~/.plansight/events.jsonl"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = PlansightConfig::default();
        assert_eq!(config.backend.timeout_ms, 10_000);
        assert_eq!(config.dashboard.source, DataSource::Csv);
        assert_eq!(config.dashboard.reload_delay_ms, 1500);
        assert!(config.logging.enabled);
    }

    #[test]
    fn default_toml_parses_back() {
        let config: PlansightConfig = toml::from_str(&PlansightConfig::default_toml()).unwrap();
        assert_eq!(config, PlansightConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: PlansightConfig = toml::from_str(
            r#"
[dashboard]
source = "json"
"#,
        )
        .unwrap();
        assert_eq!(config.dashboard.source, DataSource::Json);
        assert_eq!(config.dashboard.resource_type, "app-service");
        assert_eq!(config.backend, BackendConfig::default());
    }

    #[test]
    fn disabled_logging_has_no_path() {
        let logging = LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
        assert!(logging.resolved_path().is_none());
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(
            expand_home("/var/log/plansight.jsonl"),
            Some(PathBuf::from("/var/log/plansight.jsonl"))
        );
    }
}
