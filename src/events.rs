//! Event log for builds and classifications.
//!
//! Each build, classification and verification is appended as one JSON
//! object per line (NDJSON) to a log in the destination directory, so a
//! fuzzing fleet can tell which shell came from which checkout and profile.
//!
//! # Event Format
//!
//! - `ts`: RFC3339 timestamp
//! - `action`: `build`, `classify` or `verify`
//! - `actor`: `user@HOST`
//! - `binary`: optional path of the shell concerned
//! - `details`: freeform object with action-specific details

use crate::error::{ForgeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Shell built and installed
    Build,
    /// Shell classified
    Classify,
    /// Shell checked against an expected build mode
    Verify,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Build => write!(f, "build"),
            EventAction::Classify => write!(f, "classify"),
            EventAction::Verify => write!(f, "verify"),
        }
    }
}

/// An event record for the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,
    pub action: EventAction,
    /// Who ran the command, e.g. `user@HOST`.
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<PathBuf>,
    pub details: Value,
}

impl Event {
    /// Create a new event stamped with the current time and actor.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            binary: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            ForgeError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append `event` to the log at `log_path`, creating it and its directory if
/// needed. The line is synced to disk before returning.
pub fn append_event(log_path: &Path, event: &Event) -> Result<()> {
    let json_line = event.to_ndjson_line()?;

    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            ForgeError::UserError(format!(
                "failed to create event log directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| {
            ForgeError::UserError(format!(
                "failed to open event log '{}': {}",
                log_path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        ForgeError::UserError(format!(
            "failed to write event to '{}': {}",
            log_path.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        ForgeError::UserError(format!(
            "failed to sync event log '{}': {}",
            log_path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Append an event, downgrading failures to a warning. Used once the real
/// work of a command has already succeeded.
pub fn record_best_effort(log_path: &Path, event: &Event) {
    if let Err(e) = append_event(log_path, event) {
        tracing::warn!(log = %log_path.display(), "failed to record {} event: {}", event.action, e);
    }
}

/// Read all events from a log. Blank lines are skipped.
#[cfg(test)]
pub fn read_events(log_path: &Path) -> Result<Vec<Event>> {
    let content = fs::read_to_string(log_path).map_err(|e| {
        ForgeError::UserError(format!(
            "failed to read event log '{}': {}",
            log_path.display(),
            e
        ))
    })?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                ForgeError::UserError(format!(
                    "malformed event on line {} of '{}': {}",
                    i + 1,
                    log_path.display(),
                    e
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_event_creation() {
        let event = Event::new(EventAction::Build);

        assert_eq!(event.action, EventAction::Build);
        assert!(!event.actor.is_empty());
        assert!(event.actor.contains('@'));
        assert!(event.binary.is_none());
        let age = Utc::now().signed_duration_since(event.ts);
        assert!(age.num_minutes() < 1);
    }

    #[test]
    fn test_ndjson_line_is_single_line() {
        let event = Event::new(EventAction::Verify)
            .with_binary("/shells/js-dbg-64-linux")
            .with_details(json!({"expected": "dbg", "note": "multi\nline"}));

        let line = event.to_ndjson_line().unwrap();
        assert!(!line.contains('\n'));

        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["action"], "verify");
        assert_eq!(parsed["binary"], "/shells/js-dbg-64-linux");
        assert_eq!(parsed["details"]["expected"], "dbg");
    }

    #[test]
    fn test_binary_omitted_when_absent() {
        let line = Event::new(EventAction::Classify).to_ndjson_line().unwrap();
        assert!(!line.contains("\"binary\""));
    }

    #[test]
    fn test_append_creates_directory_and_appends() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("nested").join("shellforge-events.ndjson");

        append_event(&log, &Event::new(EventAction::Build)).unwrap();
        append_event(
            &log,
            &Event::new(EventAction::Classify).with_details(json!({"capability": "bare_interpreter"})),
        )
        .unwrap();

        let events = read_events(&log).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, EventAction::Build);
        assert_eq!(events[1].action, EventAction::Classify);
        assert_eq!(events[1].details["capability"], "bare_interpreter");
    }

    #[test]
    fn test_read_events_reports_malformed_line() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("events.ndjson");
        std::fs::write(&log, "{not json}\n").unwrap();

        let err = read_events(&log).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_record_best_effort_swallows_errors() {
        let temp = TempDir::new().unwrap();
        // A directory cannot be opened for appending.
        record_best_effort(temp.path(), &Event::new(EventAction::Build));
    }

    #[test]
    fn test_action_display() {
        assert_eq!(EventAction::Build.to_string(), "build");
        assert_eq!(EventAction::Classify.to_string(), "classify");
        assert_eq!(EventAction::Verify.to_string(), "verify");
    }
}
