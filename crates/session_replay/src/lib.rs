//! Replays a recorded session event log against the session runtime.
//!
//! The log is a JSON array of events in their wire form. Events are queued through a
//! [`SessionDispatcher`](session_runtime::SessionDispatcher) and drained in order, the same way a
//! host would deliver them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use session_runtime::{
    ConfigError, SessionAction, SessionConfig, SessionSnapshot, SessionStore, SnapshotError,
    WindowId, WindowsState,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
/// Failures while replaying an event log.
pub enum ReplayError {
    /// Invalid command-line usage.
    #[error("{0}")]
    Usage(String),
    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was read.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The event log is not a JSON array of events.
    #[error("failed to decode events in {path}: {source}")]
    Events {
        /// Event log path.
        path: String,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The config file is unreadable or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The captured snapshot could not be encoded.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// The report could not be encoded.
    #[error("failed to encode report: {0}")]
    Report(#[source] serde_json::Error),
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOptions {
    /// JSON event log.
    pub events: PathBuf,
    /// Optional TOML session config; defaults apply when absent.
    pub config: Option<PathBuf>,
    /// Window whose tabs should be captured as a snapshot after the replay.
    pub capture: Option<WindowId>,
}

/// Outcome of a replay.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    /// Number of events applied.
    pub applied: usize,
    /// Final windows state.
    pub windows: WindowsState,
    /// Snapshot of the captured window, when requested and present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SessionSnapshot>,
}

impl ReplayReport {
    /// Pretty JSON rendering of the report.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Report`] on encode failure.
    pub fn to_json(&self) -> Result<String, ReplayError> {
        serde_json::to_string_pretty(self).map_err(ReplayError::Report)
    }
}

/// Prints usage to stderr.
pub fn print_usage() {
    eprintln!(
        "usage: session_replay <events.json> [--config <session.toml>] [--capture <window-id>]"
    );
}

/// Parses arguments (without the program name). Returns `Ok(None)` when help was requested.
///
/// # Errors
///
/// Returns [`ReplayError::Usage`] for unknown flags, missing values, or a missing event log.
pub fn parse_args<I>(args: I) -> Result<Option<ReplayOptions>, ReplayError>
where
    I: IntoIterator<Item = String>,
{
    let mut events = None;
    let mut config = None;
    let mut capture = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "help" | "--help" | "-h" => return Ok(None),
            "--config" => config = Some(PathBuf::from(flag_value(&mut args, "--config")?)),
            "--capture" => capture = Some(WindowId::new(flag_value(&mut args, "--capture")?)),
            other if other.starts_with('-') => {
                return Err(ReplayError::Usage(format!("unknown option: {other}")));
            }
            other if events.is_none() => events = Some(PathBuf::from(other)),
            other => {
                return Err(ReplayError::Usage(format!("unexpected argument: {other}")));
            }
        }
    }

    let events = events.ok_or_else(|| ReplayError::Usage("missing event log path".into()))?;
    Ok(Some(ReplayOptions {
        events,
        config,
        capture,
    }))
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, ReplayError> {
    args.next()
        .ok_or_else(|| ReplayError::Usage(format!("{flag} requires a value")))
}

/// Loads the config and event log, replays the events, and reports the final state.
///
/// # Errors
///
/// Returns a [`ReplayError`] when an input cannot be read or decoded.
pub fn run(options: &ReplayOptions) -> Result<ReplayReport, ReplayError> {
    let config = match &options.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    let events = load_events(&options.events)?;

    let mut store = SessionStore::new(config);
    let dispatcher = store.dispatcher();
    for event in events {
        dispatcher.dispatch(event);
    }
    let applied = store.drain();
    info!(applied, windows = store.state().len(), "replay finished");

    let snapshot = match &options.capture {
        Some(window) => store.capture_window(window)?,
        None => None,
    };

    Ok(ReplayReport {
        applied,
        windows: store.state(),
        snapshot,
    })
}

fn load_events(path: &Path) -> Result<Vec<SessionAction>, ReplayError> {
    let body = fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&body).map_err(|source| ReplayError::Events {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn parses_log_and_flags_in_any_order() {
        let options = parse_args(args(&["--capture", "main", "events.json", "--config", "s.toml"]))
            .expect("parse")
            .expect("options");
        assert_eq!(
            options,
            ReplayOptions {
                events: PathBuf::from("events.json"),
                config: Some(PathBuf::from("s.toml")),
                capture: Some(WindowId::new("main")),
            }
        );
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(parse_args(args(&["events.json", "--help"])).expect("parse"), None);
    }

    #[test]
    fn usage_errors_are_reported() {
        assert!(matches!(parse_args(args(&[])), Err(ReplayError::Usage(_))));
        assert!(matches!(
            parse_args(args(&["events.json", "--config"])),
            Err(ReplayError::Usage(_))
        ));
        assert!(matches!(
            parse_args(args(&["events.json", "--verbose"])),
            Err(ReplayError::Usage(_))
        ));
        assert!(matches!(
            parse_args(args(&["a.json", "b.json"])),
            Err(ReplayError::Usage(_))
        ));
    }
}
