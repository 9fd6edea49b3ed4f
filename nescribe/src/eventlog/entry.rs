//! Log entry and run context types.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::parser::{Domain, Results};

/// What an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A command sent to the element (or a connection event).
    Command,
    /// A free-form note inserted by the caller.
    Comment,
}

/// One record in the event log. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,

    pub host: String,

    pub domain: Domain,

    pub kind: EntryKind,

    /// The command text as sent.
    pub stdin: String,

    /// Cleaned command output.
    pub stdout: String,

    /// Error text, empty on success.
    pub stderr: String,

    /// Parsed output, keyed by template name.
    pub results: Results,

    /// Command duration in seconds.
    #[serde(rename = "duration_secs")]
    pub duration: f64,

    /// Seconds since the start of the run.
    #[serde(rename = "elapsed_secs")]
    pub elapsed: f64,

    pub timezone_host: String,

    pub timezone_ne: String,

    /// Host reached through this session on a secondary hop (e.g. telnet).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_host: Option<String>,
}

impl LogEntry {
    /// Whether the entry records a failure.
    pub fn is_success(&self) -> bool {
        self.stderr.is_empty()
    }

    /// Get the output lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines()
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.stdout)
    }
}

/// Start of the current run, shared by every log written during it.
#[derive(Debug, Clone)]
pub struct RunContext {
    started_at: DateTime<Local>,
    started: Instant,
    host_timezone: String,
}

impl RunContext {
    /// A run starting now.
    pub fn new() -> Self {
        let started_at = Local::now();
        Self {
            host_timezone: started_at.format("UTC%:z").to_string(),
            started_at,
            started: Instant::now(),
        }
    }

    /// Override the local timezone label.
    pub fn with_host_timezone(mut self, label: impl Into<String>) -> Self {
        self.host_timezone = label.into();
        self
    }

    /// Time since the run started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Wall-clock time derived from the monotonic clock, so successive
    /// calls never go backwards.
    pub fn now(&self) -> DateTime<Local> {
        let offset = chrono::Duration::from_std(self.elapsed()).unwrap_or_else(|_| chrono::Duration::zero());
        self.started_at
            .checked_add_signed(offset)
            .unwrap_or(self.started_at)
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn host_timezone(&self) -> &str {
        &self.host_timezone
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Seconds rounded to 0.1 ms.
pub(crate) fn seconds(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_rounding() {
        assert_eq!(seconds(Duration::from_micros(1_234_567)), 1.2346);
        assert_eq!(seconds(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_run_clock_is_monotonic() {
        let run = RunContext::new();
        let first = run.now();
        let second = run.now();
        assert!(second >= first);
        assert!(first >= run.started_at());
    }
}
