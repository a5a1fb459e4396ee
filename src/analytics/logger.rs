use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::events::CycleEvent;
use crate::config::PlansightConfig;

// ---------------------------------------------------------------------------
// Event log (JSONL)
// ---------------------------------------------------------------------------

/// Append-only JSONL event log.
///
/// Logging is best-effort: a write failure is swallowed so that a read-only
/// home directory never breaks the dashboard.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    /// Log to `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A log that drops every event.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// The log configured by `[logging]`.
    pub fn from_config(config: &PlansightConfig) -> Self {
        Self {
            path: config.logging.resolved_path(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record an event. Failures are ignored.
    pub fn record(&self, event: &CycleEvent) {
        let _ = self.append(event);
    }

    fn append(&self, event: &CycleEvent) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(event)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    /// Read every event. Malformed lines are skipped; a missing file reads
    /// as empty.
    pub fn read_all(&self) -> Vec<CycleEvent> {
        let Some(path) = self.path.as_deref() else {
            return Vec::new();
        };

        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<CycleEvent>(&line).ok())
            .collect()
    }

    /// Read events from the last `days` days, or all of them for `None`.
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<CycleEvent> {
        let events = self.read_all();
        let Some(days) = days else {
            return events;
        };

        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
        events
            .into_iter()
            .filter(|e| {
                DateTime::parse_from_rfc3339(&e.timestamp)
                    .map(|ts| ts >= cutoff)
                    .unwrap_or(false)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::events::{EventKind, Outcome};

    fn temp_log(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "plansight-log-{}-{name}.jsonl",
            std::process::id()
        ));
        fs::remove_file(&path).ok();
        path
    }

    #[test]
    fn records_and_reads_back() {
        let path = temp_log("roundtrip");
        let log = EventLog::at(&path);
        log.record(&CycleEvent::now(EventKind::Render, "app-service", "csv", Outcome::Ready));
        log.record(&CycleEvent::now(EventKind::Upload, "app-service", "csv", Outcome::Rejected));
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .and_then(|mut f| writeln!(f, "not json"))
            .unwrap();

        let events = log.read_all();
        fs::remove_file(&path).ok();

        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, EventKind::Upload);
    }

    #[test]
    fn day_window_drops_old_events() {
        let path = temp_log("window");
        let log = EventLog::at(&path);
        let mut old = CycleEvent::now(EventKind::Render, "app-service", "csv", Outcome::Ready);
        old.timestamp = "2020-01-01T00:00:00+00:00".to_string();
        log.record(&old);
        log.record(&CycleEvent::now(EventKind::Render, "app-service", "csv", Outcome::Error));

        let recent = log.read_since_days(Some(7));
        let all = log.read_since_days(None);
        fs::remove_file(&path).ok();

        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].outcome, Outcome::Error);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn disabled_log_is_silent() {
        let log = EventLog::disabled();
        log.record(&CycleEvent::now(EventKind::Render, "x", "csv", Outcome::Ready));
        assert!(log.read_all().is_empty());
        assert!(log.path().is_none());
    }
}
