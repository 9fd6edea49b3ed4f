//! Error types for nescribe.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::eventlog::LogEntry;
use crate::session::Role;

/// Main error type for nescribe operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Session / command execution errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Event log errors
    #[error("Log error: {0}")]
    Log(#[from] LogError),

    /// An entry was built but could not be written
    #[error("Log error: {0}")]
    Unrecorded(#[from] Unrecorded),

    /// Template parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Transport layer errors (SSH connection, authentication, channel reads).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host key not present in known_hosts (strict mode)
    #[error("Host key for {host}:{port} is not known")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Read timed out before the expected pattern appeared
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl TransportError {
    /// Whether this error is a read/connect timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// Session layer errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The transport could not be established or authenticated.
    #[error("Connection to {host} as '{role}' (port {port}) failed: {source}")]
    Connection {
        host: String,
        role: Role,
        port: u16,
        #[source]
        source: TransportError,
    },

    /// A command did not complete (response timeout or channel loss).
    #[error("Command '{command}' on {host} failed: {source}")]
    CommandExecution {
        host: String,
        command: String,
        #[source]
        source: TransportError,
    },
}

/// Event log errors.
#[derive(Error, Debug)]
pub enum LogError {
    /// Write attempted against a closed or never-opened log.
    #[error("Log file for {host} not open, write request blocked")]
    FileNotOpen { host: String },

    /// I/O error on the log file
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A log entry that was built but not persisted.
///
/// Logging failures never abort command execution, so the entry travels
/// with the error and callers can still use it.
#[derive(Error, Debug)]
#[error("entry not written: {source}")]
pub struct Unrecorded {
    pub entry: Box<LogEntry>,
    #[source]
    pub source: LogError,
}

impl Unrecorded {
    /// Recover the entry that failed to be written.
    pub fn into_entry(self) -> LogEntry {
        *self.entry
    }
}

/// Template parsing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A row's value count does not match the header's field count.
    #[error("Row {row} has {found} values but the header has {expected} fields")]
    Arity {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Result type alias using nescribe's Error.
pub type Result<T> = std::result::Result<T, Error>;
