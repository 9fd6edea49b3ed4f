//! Builder for opening sessions.

use std::time::Duration;

use secrecy::SecretString;

use super::Session;
use super::role::Role;
use crate::error::Result;
use crate::eventlog::SharedEventLog;
use crate::transport::{ConnectTarget, Connector, get_credential, get_port};

/// Resolved settings for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub role: Role,
    pub port: u16,
    pub credential: Option<SecretString>,

    /// Connection and authentication timeout.
    pub connect_timeout: Duration,

    /// Default response timeout for reads.
    pub read_timeout: Duration,

    /// Input acknowledging a continuation prompt.
    pub continuation_response: String,

    /// Run `date` after login to learn the element's timezone.
    pub probe_timezone: bool,
}

impl SessionConfig {
    /// Connection parameters for the transport.
    pub fn target(&self) -> ConnectTarget {
        ConnectTarget {
            host: self.host.clone(),
            port: self.port,
            username: self.role.username().to_string(),
            credential: self.credential.clone(),
            timeout: self.connect_timeout,
        }
    }
}

/// Builder for constructing sessions.
///
/// Port and credential default to the role lookups
/// ([`get_port`], [`get_credential`]).
///
/// # Example
///
/// ```rust,no_run
/// use nescribe::eventlog::{EventLog, LogConfig, OpenMode, RunContext};
/// use nescribe::session::{Role, SessionBuilder};
/// use nescribe::transport::SshConnector;
///
/// # async fn example() -> Result<(), nescribe::Error> {
/// let log = EventLog::open("192.168.1.1", OpenMode::Create, &LogConfig::default(), RunContext::new())?
///     .shared();
///
/// let mut session = SessionBuilder::new("192.168.1.1")
///     .role(Role::Admin)
///     .open(&SshConnector::default(), log)
///     .await?;
///
/// let entry = session.execute("show version").await?;
/// println!("{}", entry.stdout);
///
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    role: Role,
    port: Option<u16>,
    credential: Option<SecretString>,
    connect_timeout: Duration,
    read_timeout: Duration,
    continuation_response: String,
    probe_timezone: bool,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            role: Role::Root,
            port: None,
            credential: None,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            continuation_response: "y".to_string(),
            probe_timezone: true,
        }
    }

    /// Set the login role (default: root).
    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Override the role's port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Override the role's credential.
    pub fn credential(mut self, password: impl Into<String>) -> Self {
        self.credential = Some(SecretString::from(password.into()));
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Input sent to acknowledge a continuation prompt (default: `y`).
    pub fn continuation_response(mut self, response: impl Into<String>) -> Self {
        self.continuation_response = response.into();
        self
    }

    pub fn probe_timezone(mut self, probe: bool) -> Self {
        self.probe_timezone = probe;
        self
    }

    /// Resolve the configuration without connecting.
    pub fn build(self) -> SessionConfig {
        SessionConfig {
            port: self.port.unwrap_or_else(|| get_port(self.role)),
            credential: self.credential.or_else(|| get_credential(self.role)),
            host: self.host,
            role: self.role,
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            continuation_response: self.continuation_response,
            probe_timezone: self.probe_timezone,
        }
    }

    /// Connect and open the session.
    pub async fn open<C: Connector>(self, connector: &C, log: SharedEventLog) -> Result<Session<C::Transport>> {
        Session::open(connector, self.build(), log).await
    }
}
