//! Transport layer consumed by the session engine.
//!
//! The engine only needs four primitives from an interactive channel:
//! send a line, read until a pattern appears (with a timeout), report
//! liveness, and close. [`SshTransport`] provides them over russh.

pub mod config;
#[cfg(test)]
pub(crate) mod scripted;
mod ssh;

pub use config::{AuthMethod, ConnectTarget, HostKeyVerification, SshConfig, get_credential, get_port};
pub use ssh::{SshConnector, SshTransport};

use std::future::Future;
use std::time::Duration;

use regex::Regex;

use crate::channel::Captured;
use crate::error::TransportError;

/// An established, authenticated interactive channel.
pub trait Transport: Send {
    /// Send one line of input.
    fn send(&mut self, input: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Read until `pattern` matches the received text or `timeout` elapses.
    ///
    /// Text received after the match stays buffered for the next call.
    fn receive_until(
        &mut self,
        pattern: &Regex,
        timeout: Duration,
    ) -> impl Future<Output = Result<Captured, TransportError>> + Send;

    /// Whether the underlying connection is still usable.
    fn is_alive(&self) -> bool;

    /// Close the channel and the connection.
    fn close(self) -> impl Future<Output = Result<(), TransportError>> + Send
    where
        Self: Sized;
}

/// Opens transports to a target.
pub trait Connector: Send + Sync {
    /// The transport produced by this connector.
    type Transport: Transport;

    /// Connect and authenticate within `target.timeout`.
    fn connect(
        &self,
        target: &ConnectTarget,
    ) -> impl Future<Output = Result<Self::Transport, TransportError>> + Send;
}
