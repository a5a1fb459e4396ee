//! Configuration system for plansight.
//!
//! Provides a layered configuration hierarchy:
//!
//! 1. **Built-in defaults**: [`schema::PlansightConfig::default()`]
//! 2. **User global config**: `~/.plansight/config.toml`
//! 3. **Project local config**: `.plansight.toml` in the current directory
//! 4. **Environment variables**: `PLANSIGHT_*` overrides (highest precedence)
//!
//! Later layers override earlier ones key by key: a project file that only
//! sets `dashboard.source` keeps the global file's backend URL.
//!
//! # Usage
//!
//! ```rust,ignore
//! use plansight::config;
//!
//! let cfg = config::load();
//! let client = BackendClient::from_config(&cfg);
//! ```

pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::client::DataSource;

pub use schema::PlansightConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges defaults → global TOML → project TOML → env vars.
pub fn load() -> PlansightConfig {
    let files = [global_config_path(), project_config_path()];
    let mut config = load_layers(files.iter().flatten().map(PathBuf::as_path));
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Merge the TOML files at `paths`, in order, over the defaults.
///
/// A layer is skipped as a whole when the file is missing, is not valid
/// TOML, or holds a value of the wrong type; the layers before it still
/// apply.
pub fn load_layers<'a>(paths: impl IntoIterator<Item = &'a Path>) -> PlansightConfig {
    let mut config = PlansightConfig::default();
    let Ok(mut merged) = toml::Value::try_from(&config) else {
        return config;
    };

    for path in paths {
        let Some(layer) = load_toml_value(path) else {
            continue;
        };
        let mut candidate = merged.clone();
        merge_values(&mut candidate, layer);
        if let Ok(resolved) = candidate.clone().try_into::<PlansightConfig>() {
            config = resolved;
            merged = candidate;
        }
    }

    config
}

fn load_toml_value(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Recursively overlay `overlay` onto `base`: tables merge, everything else
/// is replaced.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.plansight/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".plansight").join("config.toml"))
}

/// Path to the project local config: `.plansight.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".plansight.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment overrides, reading variables through `var`.
///
/// Supported variables:
/// - `PLANSIGHT_BACKEND_URL`: backend base URL
/// - `PLANSIGHT_TIMEOUT_MS`: request timeout
/// - `PLANSIGHT_SOURCE`: `csv` or `json`
/// - `PLANSIGHT_RESOURCE_TYPE`: default resource type
/// - `PLANSIGHT_RELOAD_DELAY_MS`: delay before the post-action reload
/// - `PLANSIGHT_LOG`: event logging on/off (`1`/`true`/`yes`/`on`)
pub fn apply_overrides(config: &mut PlansightConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("PLANSIGHT_BACKEND_URL")
        && !val.is_empty()
    {
        config.backend.base_url = val;
    }
    if let Some(val) = var("PLANSIGHT_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.backend.timeout_ms = ms;
    }
    if let Some(val) = var("PLANSIGHT_SOURCE")
        && let Some(source) = DataSource::parse(&val)
    {
        config.dashboard.source = source;
    }
    if let Some(val) = var("PLANSIGHT_RESOURCE_TYPE")
        && !val.is_empty()
    {
        config.dashboard.resource_type = val;
    }
    if let Some(val) = var("PLANSIGHT_RELOAD_DELAY_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.dashboard.reload_delay_ms = ms;
    }
    if let Some(val) = var("PLANSIGHT_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
pub fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.plansight/config.toml`.
///
/// Fails if the file already exists, unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.plansight/ directory")?;
    }

    fs::write(&path, PlansightConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single dotted key (e.g. `backend.timeout_ms`) in the global config
/// file, creating the file from defaults when it doesn't exist yet.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&PlansightConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject values the schema can't load, e.g. `dashboard.source = "xml"`.
    let _: PlansightConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path. The new value
/// takes the type of the value it replaces.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let Some((section, leaf)) = key.rsplit_once('.') else {
        anyhow::bail!("config keys look like 'section.key', got '{key}'");
    };

    let mut current = root;
    for part in section.split('.') {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{section}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "plansight-config-{}-{name}.toml",
            std::process::id()
        ));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn is_truthy_accepts_variants() {
        for yes in ["1", "true", "TRUE", "yes", "on", "ON"] {
            assert!(is_truthy(yes), "{yes}");
        }
        for no in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(no), "{no}");
        }
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = PlansightConfig::default();
        apply_overrides(
            &mut config,
            env(&[
                ("PLANSIGHT_BACKEND_URL", "http://backend:8000"),
                ("PLANSIGHT_TIMEOUT_MS", "2500"),
                ("PLANSIGHT_SOURCE", "JSON"),
                ("PLANSIGHT_RELOAD_DELAY_MS", "0"),
                ("PLANSIGHT_LOG", "off"),
            ]),
        );
        assert_eq!(config.backend.base_url, "http://backend:8000");
        assert_eq!(config.backend.timeout_ms, 2500);
        assert_eq!(config.dashboard.source, DataSource::Json);
        assert_eq!(config.dashboard.reload_delay_ms, 0);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut config = PlansightConfig::default();
        apply_overrides(
            &mut config,
            env(&[("PLANSIGHT_TIMEOUT_MS", "soon"), ("PLANSIGHT_SOURCE", "xml")]),
        );
        assert_eq!(config, PlansightConfig::default());
    }

    #[test]
    fn later_layers_override_key_by_key() {
        let global = temp_file(
            "global",
            "[backend]\nbase_url = \"http://global:5000\"\n[dashboard]\nsource = \"json\"\n",
        );
        let project = temp_file("project", "[dashboard]\nresource_type = \"functions\"\n");
        let config = load_layers([global.as_path(), project.as_path()]);
        fs::remove_file(&global).ok();
        fs::remove_file(&project).ok();

        assert_eq!(config.backend.base_url, "http://global:5000");
        assert_eq!(config.dashboard.source, DataSource::Json);
        assert_eq!(config.dashboard.resource_type, "functions");
        assert_eq!(config.dashboard.reload_delay_ms, 1500);
    }

    #[test]
    fn malformed_layer_is_skipped() {
        let broken = temp_file("broken", "[backend\nbase_url = ");
        let config = load_layers([broken.as_path()]);
        fs::remove_file(&broken).ok();
        assert_eq!(config, PlansightConfig::default());
    }

    #[test]
    fn badly_typed_layer_keeps_earlier_layers() {
        let global = temp_file(
            "typed-global",
            "[backend]\nbase_url = \"http://global:5000\"\n",
        );
        let project = temp_file(
            "typed-project",
            "[backend]\ntimeout_ms = \"x\"\n[dashboard]\nresource_type = \"functions\"\n",
        );
        let config = load_layers([global.as_path(), project.as_path()]);
        fs::remove_file(&global).ok();
        fs::remove_file(&project).ok();

        assert_eq!(config.backend.base_url, "http://global:5000");
        assert_eq!(config.backend.timeout_ms, 10_000);
        assert_eq!(config.dashboard.resource_type, "app-service");
    }

    #[test]
    fn set_toml_value_keeps_types() {
        let mut root: toml::Value =
            toml::from_str("[web]\nopen_browser = true\n[backend]\ntimeout_ms = 100\n").unwrap();
        set_toml_value(&mut root, "web.open_browser", "no").unwrap();
        set_toml_value(&mut root, "backend.timeout_ms", "50").unwrap();
        assert_eq!(root["web"]["open_browser"].as_bool(), Some(false));
        assert_eq!(root["backend"]["timeout_ms"].as_integer(), Some(50));
        assert!(set_toml_value(&mut root, "backend.timeout_ms", "fast").is_err());
    }

    #[test]
    fn set_toml_value_rejects_unknown_keys() {
        let mut root: toml::Value = toml::from_str("[web]\naddr = \"x\"\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "v").is_err());
        assert!(set_toml_value(&mut root, "web.port", "1").is_err());
        assert!(set_toml_value(&mut root, "addr", "1").is_err());
    }
}
