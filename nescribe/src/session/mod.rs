//! Interactive CLI sessions against a network element.
//!
//! A [`Session`] owns one transport, tracks the role it believes it is
//! logged in as, and records every exchange in a shared event log.
//!
//! Command completion is prompt-driven: a command is done when the active
//! role's prompt, the last confirmed prompt, or the continuation marker
//! appears at the end of the output. Continuation markers are acknowledged
//! and the pages joined, so callers always see the full output.

mod builder;
mod command;
mod role;

pub use builder::{SessionBuilder, SessionConfig};
pub use command::Command;
pub use role::{Role, RoleProfile};

use std::sync::{LazyLock, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, error, info, trace, warn};
use regex::Regex;

use crate::channel::patterns::{self, CONTINUATION, CONTINUATION_PROMPT, GENERIC, GENERIC_PROMPT};
use crate::error::{Result, SessionError, TransportError};
use crate::eventlog::{EventLog, LogEntry, SharedEventLog};
use crate::parser::Domain;
use crate::transport::{Connector, Transport};

/// Recorded as the output of a command that did not complete.
const FAILED_OUTPUT: &str = "Failed command response";

/// Timezone label used when the element's `date` output is unusable.
const UNKNOWN_TIMEZONE: &str = "Not Set";

static DATE_TIMEZONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\S+\s*\S+\d{1,2}\s*\d{2}:\d{2}:\d{2}\s*(\S+)").expect("valid date pattern")
});

/// An open CLI session on one network element.
pub struct Session<T: Transport> {
    host: String,

    /// Transport (None once closed).
    transport: Option<T>,

    /// Role the session logged in as.
    home: RoleProfile,

    /// Role commands currently run in.
    active: RoleProfile,

    /// Last confirmed prompt; empty when unverified.
    prompt: String,

    /// Prompt confirmed at login.
    home_prompt: String,

    /// Completion pattern for commands without an override.
    default_prompt: Regex,

    read_timeout: Duration,
    continuation_response: String,
    secondary_host: Option<String>,
    log: SharedEventLog,
}

impl<T: Transport> Session<T> {
    /// Connect, wait for the login prompt and confirm the role.
    ///
    /// Both outcomes of the connection attempt are recorded. A session
    /// whose login prompt does not carry the role's signature still opens,
    /// completing commands on the generic prompt.
    pub async fn open<C>(connector: &C, config: SessionConfig, log: SharedEventLog) -> Result<Self>
    where
        C: Connector<Transport = T>,
    {
        let target = config.target();
        let attempt = format!(
            "connect(port={}, username={}, password=****)",
            target.port, target.username
        );

        info!("{}: connecting as {} on port {}", config.host, config.role, config.port);
        let start = Instant::now();

        let transport = match connector.connect(&target).await {
            Ok(transport) => transport,
            Err(source) => {
                error!("{}: connection failed: {}", config.host, source);
                record_to(
                    &log,
                    &attempt,
                    "",
                    &format!("Connection failed: {}", source),
                    start.elapsed(),
                    Domain::Na,
                    None,
                );
                return Err(SessionError::Connection {
                    host: config.host,
                    role: config.role,
                    port: config.port,
                    source,
                }
                .into());
            }
        };

        record_to(
            &log,
            &attempt,
            &format!("Connected: {}", config.host),
            "",
            start.elapsed(),
            Domain::Na,
            None,
        );

        let profile = RoleProfile::for_role(config.role);
        let mut session = Self {
            host: config.host,
            transport: Some(transport),
            home: profile.clone(),
            active: profile,
            prompt: String::new(),
            home_prompt: String::new(),
            default_prompt: GENERIC.clone(),
            read_timeout: config.read_timeout,
            continuation_response: config.continuation_response,
            secondary_host: None,
            log,
        };

        if let Err(source) = session.await_login_prompt().await {
            error!("{}: no login prompt: {}", session.host, source);
            if let Some(transport) = session.transport.take() {
                if let Err(e) = transport.close().await {
                    debug!("{}: close after failed login: {}", session.host, e);
                }
            }
            session.record(
                &attempt,
                "",
                &format!("Connection failed: {}", source),
                start.elapsed(),
                Domain::Na,
            );
            return Err(SessionError::Connection {
                host: session.host.clone(),
                role: config.role,
                port: config.port,
                source,
            }
            .into());
        }

        if config.probe_timezone {
            session.probe_timezone().await;
        }

        Ok(session)
    }

    /// Read the prompt waiting after login and adopt it if it belongs to
    /// the home role.
    async fn await_login_prompt(&mut self) -> std::result::Result<(), TransportError> {
        let initial = patterns::union(&[self.home.prompt.as_str(), GENERIC_PROMPT])?;
        let transport = self.transport.as_mut().ok_or(TransportError::Disconnected)?;
        let captured = transport.receive_until(&initial, self.read_timeout).await?;
        let observed = patterns::prompt_line(&captured.text()).to_string();

        if self.home.matches(&observed) {
            debug!("{}: login prompt {:?}", self.host, observed);
            self.prompt = observed;
        } else {
            warn!(
                "{}: login prompt {:?} does not match role '{}', using generic prompt",
                self.host, observed, self.home.role
            );
        }

        self.home_prompt = self.prompt.clone();
        self.rebuild_default_prompt();
        Ok(())
    }

    /// Learn the element's timezone from `date`. Not recorded.
    async fn probe_timezone(&mut self) {
        let label = match self.exchange("date").await {
            Ok(output) => parse_timezone(&output).unwrap_or(UNKNOWN_TIMEZONE).to_string(),
            Err(e) => {
                warn!("{}: timezone probe failed: {}", self.host, e);
                UNKNOWN_TIMEZONE.to_string()
            }
        };
        debug!("{}: element timezone {}", self.host, label);
        self.lock_log().set_ne_timezone(label);
    }

    /// Send one line and return the text before the default prompt.
    async fn exchange(&mut self, input: &str) -> std::result::Result<String, TransportError> {
        let transport = self.transport.as_mut().ok_or(TransportError::Disconnected)?;
        transport.send(input).await?;
        let captured = transport
            .receive_until(&self.default_prompt, self.read_timeout)
            .await?;
        Ok(captured.before)
    }

    /// Check that the prompt currently shown belongs to `role`.
    ///
    /// On success `role` becomes the active role. On mismatch or timeout the
    /// confirmed prompt is cleared and commands complete on the generic
    /// prompt until the next successful verification.
    pub async fn verify_prompt(&mut self, role: Role) -> bool {
        let profile = RoleProfile::for_role(role);

        match self.read_prompt(&profile.prompt).await {
            Ok(observed) if profile.matches(&observed) => {
                debug!("{}: prompt {:?} confirms role '{}'", self.host, observed, role);
                self.active = profile;
                self.prompt = observed;
                self.rebuild_default_prompt();
                true
            }
            Ok(observed) => {
                warn!("{}: prompt {:?} does not match role '{}'", self.host, observed, role);
                self.fall_back();
                false
            }
            Err(e) => {
                warn!("{}: prompt verification for '{}' failed: {}", self.host, role, e);
                self.fall_back();
                false
            }
        }
    }

    /// [`verify_prompt`](Self::verify_prompt), recording the outcome as a
    /// comment.
    pub async fn login_verification(&mut self, role: Role) -> bool {
        let verified = self.verify_prompt(role).await;
        let text = if verified {
            format!("{} login verified with prompt {}", role, self.prompt)
        } else {
            format!("{} login verification failed", role)
        };
        self.comment(&text);
        verified
    }

    async fn read_prompt(&mut self, pattern: &Regex) -> std::result::Result<String, TransportError> {
        let transport = self.transport.as_mut().ok_or(TransportError::Disconnected)?;
        transport.send("").await?;
        let captured = transport.receive_until(pattern, self.read_timeout).await?;
        Ok(patterns::prompt_line(&captured.text()).to_string())
    }

    /// Return to the role and prompt confirmed at login.
    pub fn reset_role(&mut self) {
        self.active = self.home.clone();
        self.prompt = self.home_prompt.clone();
        self.rebuild_default_prompt();
    }

    fn fall_back(&mut self) {
        self.prompt.clear();
        self.rebuild_default_prompt();
    }

    fn rebuild_default_prompt(&mut self) {
        let base = patterns::literal_prompt(&self.prompt);
        self.default_prompt =
            patterns::union(&[self.active.prompt.as_str(), CONTINUATION_PROMPT, &base]).unwrap_or_else(|e| {
                warn!("{}: invalid prompt pattern: {}", self.host, e);
                GENERIC.clone()
            });
        trace!("{}: default prompt {}", self.host, self.default_prompt.as_str());
    }

    /// Run one command and record it.
    ///
    /// The entry is returned with parsed results for the active role's
    /// domain. On a dead connection nothing is sent and an entry noting the
    /// closure is returned instead. Failures are recorded before the error
    /// is returned.
    pub async fn execute(&mut self, command: impl Into<Command>) -> Result<LogEntry> {
        let command = command.into();
        let domain = self.active.domain;

        if !self.is_alive() {
            warn!("{}: connection closed, not sending '{}'", self.host, command.text);
            return Ok(self.record("is_alive()", "", "abnormal connection closure", Duration::ZERO, domain));
        }

        let prompt = command.prompt.clone().unwrap_or_else(|| self.default_prompt.clone());
        let timeout = command.timeout.unwrap_or(self.read_timeout);

        let start = Instant::now();
        match self.run(&command, &prompt, timeout).await {
            Ok(output) => {
                let duration = start.elapsed();
                debug!("{}: '{}' completed in {:?}", self.host, command.text, duration);
                Ok(self.record(&command.text, &output, "", duration, domain))
            }
            Err(source) => {
                error!("{}: '{}' failed: {}", self.host, command.text, source);
                self.record(
                    &format!("{}: {}", self.host, command.text),
                    FAILED_OUTPUT,
                    &source.to_string(),
                    start.elapsed(),
                    domain,
                );
                Err(SessionError::CommandExecution {
                    host: self.host.clone(),
                    command: command.text,
                    source,
                }
                .into())
            }
        }
    }

    /// Run commands in order, stopping at the first failure.
    pub async fn execute_all<I, C>(&mut self, commands: I) -> Result<Vec<LogEntry>>
    where
        I: IntoIterator<Item = C>,
        C: Into<Command>,
    {
        let mut entries = Vec::new();
        for command in commands {
            entries.push(self.execute(command).await?);
        }
        Ok(entries)
    }

    async fn run(
        &mut self,
        command: &Command,
        prompt: &Regex,
        timeout: Duration,
    ) -> std::result::Result<String, TransportError> {
        let transport = self.transport.as_mut().ok_or(TransportError::Disconnected)?;
        transport.send(&command.text).await?;

        // A prompt seen before the echo belongs to earlier output.
        let mut received = String::new();
        let mut last = loop {
            let captured = transport.receive_until(prompt, timeout).await?;
            received.push_str(&captured.before);
            if !command.verify_echo || received.contains(&command.text) {
                break captured;
            }
            trace!("{}: prompt before echo of '{}', reading on", self.host, command.text);
            received.push_str(&captured.matched);
        };

        let mut output = strip_continuation(without_echo(&received, command));

        let mut pages = 1;
        while CONTINUATION.is_match(&last.matched) {
            trace!("{}: continuation after page {}", self.host, pages);
            transport.send(&self.continuation_response).await?;
            last = transport.receive_until(prompt, self.read_timeout).await?;
            output.push_str(&strip_continuation(&last.before));
            pages += 1;
        }

        if pages > 1 {
            debug!("{}: '{}' returned {} pages", self.host, command.text, pages);
        }
        Ok(output)
    }

    /// Insert a comment into the session's log.
    pub fn comment(&self, text: &str) -> LogEntry {
        let result = self.lock_log().comment(text, self.secondary_host.as_deref());
        result.unwrap_or_else(|unrecorded| {
            warn!("{}: {}", self.host, unrecorded);
            unrecorded.into_entry()
        })
    }

    /// Tag subsequent entries with a second device address.
    pub fn set_secondary_host(&mut self, host: Option<String>) {
        self.secondary_host = host;
    }

    /// Close the transport and record the closure. Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        let Some(transport) = self.transport.take() else {
            return Ok(());
        };
        info!("{}: closing session", self.host);

        let start = Instant::now();
        let result = transport.close().await;
        let stderr = match &result {
            Ok(()) => String::new(),
            Err(e) => e.to_string(),
        };
        self.record(
            "close()",
            &format!("Disconnected: {}", self.host),
            &stderr,
            start.elapsed(),
            Domain::Na,
        );

        result?;
        Ok(())
    }

    pub fn is_alive(&self) -> bool {
        self.transport.as_ref().is_some_and(Transport::is_alive)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Role commands currently run in.
    pub fn role(&self) -> Role {
        self.active.role
    }

    pub fn domain(&self) -> Domain {
        self.active.domain
    }

    /// Last confirmed prompt, empty when unverified.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn default_prompt(&self) -> &Regex {
        &self.default_prompt
    }

    pub fn secondary_host(&self) -> Option<&str> {
        self.secondary_host.as_deref()
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    pub fn log(&self) -> &SharedEventLog {
        &self.log
    }

    fn lock_log(&self) -> MutexGuard<'_, EventLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, stdin: &str, stdout: &str, stderr: &str, duration: Duration, domain: Domain) -> LogEntry {
        record_to(
            &self.log,
            stdin,
            stdout,
            stderr,
            duration,
            domain,
            self.secondary_host.as_deref(),
        )
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if self.transport.is_some() {
            warn!("Session to {} dropped without close", self.host);
            self.record(
                "close()",
                "",
                "abnormal close: session dropped while open",
                Duration::ZERO,
                Domain::Na,
            );
        }
    }
}

/// Record an event, keeping the entry when the log cannot take it.
fn record_to(
    log: &SharedEventLog,
    stdin: &str,
    stdout: &str,
    stderr: &str,
    duration: Duration,
    domain: Domain,
    secondary_host: Option<&str>,
) -> LogEntry {
    let mut log = log.lock().unwrap_or_else(PoisonError::into_inner);
    log.record_event(stdin, stdout, stderr, duration, domain, secondary_host)
        .unwrap_or_else(|unrecorded| {
            warn!("{}", unrecorded);
            unrecorded.into_entry()
        })
}

/// Output following the command echo, leading line breaks removed.
fn without_echo<'a>(received: &'a str, command: &Command) -> &'a str {
    let body = if command.verify_echo {
        received
            .find(&command.text)
            .map_or(received, |pos| &received[pos + command.text.len()..])
    } else {
        received
            .trim_start()
            .strip_prefix(command.text.as_str())
            .unwrap_or(received)
    };
    body.trim_start_matches(['\r', '\n'])
}

fn strip_continuation(page: &str) -> String {
    CONTINUATION.replace_all(page, "").into_owned()
}

/// Timezone abbreviation from `date` output.
fn parse_timezone(output: &str) -> Option<&str> {
    DATE_TIMEZONE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::error::Error;
    use crate::eventlog::{LogConfig, OpenMode, RunContext};
    use crate::transport::scripted::{ScriptedConnector, ScriptedTransport};

    const GREETING: &str = "Welcome to NE-1\nNE-1# ";

    fn shared_log(dir: &Path) -> SharedEventLog {
        EventLog::open(
            "ne1",
            OpenMode::Create,
            &LogConfig::new(dir, dir.join("templates")),
            RunContext::new(),
        )
        .unwrap()
        .shared()
    }

    fn admin_config() -> SessionConfig {
        SessionBuilder::new("ne1")
            .role(Role::Admin)
            .port(22)
            .credential("secret")
            .read_timeout(Duration::from_millis(50))
            .probe_timezone(false)
            .build()
    }

    async fn open(transport: ScriptedTransport, log: SharedEventLog) -> Session<ScriptedTransport> {
        Session::open(&ScriptedConnector::new(transport), admin_config(), log)
            .await
            .unwrap()
    }

    fn records(log: &SharedEventLog) -> usize {
        log.lock().unwrap().records_written()
    }

    fn read_log(log: &SharedEventLog) -> Vec<serde_json::Value> {
        let mut log = log.lock().unwrap();
        log.close().unwrap();
        let text = std::fs::read_to_string(log.path()).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn test_open_confirms_login_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let mut session = open(ScriptedTransport::new().greeting(GREETING), log.clone()).await;

        assert_eq!(session.prompt(), "NE-1#");
        assert_eq!(session.role(), Role::Admin);
        assert_eq!(session.domain(), Domain::Ne);
        assert!(session.is_alive());
        assert_eq!(records(&log), 1);

        session.close().await.unwrap();
        let entries = read_log(&log);
        assert_eq!(entries[0]["stdin"], "connect(port=22, username=admin, password=****)");
        assert_eq!(entries[0]["stdout"], "Connected: ne1");
    }

    #[tokio::test]
    async fn test_open_records_connection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());

        let result = Session::open(&ScriptedConnector::failing(), admin_config(), log.clone()).await;
        match result {
            Err(Error::Session(SessionError::Connection { host, role, port, .. })) => {
                assert_eq!(host, "ne1");
                assert_eq!(role, Role::Admin);
                assert_eq!(port, 22);
            }
            other => panic!("expected connection error, got {:?}", other.err()),
        }

        let entries = read_log(&log);
        assert_eq!(entries.len(), 1);
        assert!(
            entries[0]["stderr"]
                .as_str()
                .unwrap()
                .starts_with("Connection failed:")
        );
    }

    #[tokio::test]
    async fn test_open_without_login_prompt_fails() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let connector = ScriptedConnector::new(ScriptedTransport::new().greeting("Welcome"));

        let result = Session::open(&connector, admin_config(), log.clone()).await;
        assert!(matches!(
            result,
            Err(Error::Session(SessionError::Connection { .. }))
        ));

        let entries = read_log(&log);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["stdout"], "Connected: ne1");
        assert_eq!(entries[1]["stdin"], "connect(port=22, username=admin, password=****)");
        assert!(
            entries[1]["stderr"]
                .as_str()
                .unwrap()
                .starts_with("Connection failed:")
        );
    }

    #[tokio::test]
    async fn test_dropped_session_records_abnormal_close() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let session = open(ScriptedTransport::new().greeting(GREETING), log.clone()).await;
        drop(session);

        let entries = read_log(&log);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["stdin"], "close()");
        assert!(entries[1]["stderr"].as_str().unwrap().starts_with("abnormal close"));
    }

    #[tokio::test]
    async fn test_continuation_pages_use_read_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let transport = ScriptedTransport::new()
            .greeting(GREETING)
            .on("show slot *", "show slot *\nA...more? y=[yes]");
        let mut session = open(transport, log).await;

        let command = Command::new("show slot *").with_timeout(Duration::from_secs(300));
        match session.execute(command).await {
            Err(Error::Session(SessionError::CommandExecution { source, .. })) => {
                assert!(matches!(source, TransportError::Timeout(d) if d == Duration::from_millis(50)));
            }
            other => panic!("expected a timeout on the second page, got {:?}", other.map(|e| e.stdout)),
        }
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_unexpected_login_prompt_uses_generic() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let mut session = open(ScriptedTransport::new().greeting("login ok\nNE-1> "), log).await;

        assert_eq!(session.prompt(), "");
        assert!(session.default_prompt().is_match("anything\n$ "));
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_single_read() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let transport = ScriptedTransport::new()
            .greeting(GREETING)
            .on("show version", "show version\r\nVersion 1.0\r\nNE-1# ");
        let mut session = open(transport, log.clone()).await;
        let reads = session.transport().unwrap().reads;

        let entry = session.execute("show version").await.unwrap();

        assert_eq!(entry.stdout.trim_end(), "Version 1.0");
        assert_eq!(entry.stdin, "show version");
        assert_eq!(entry.domain, Domain::Ne);
        assert!(entry.is_success());
        assert_eq!(session.transport().unwrap().reads - reads, 1);
        assert_eq!(records(&log), 2);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_joins_continuation_pages() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let transport = ScriptedTransport::new()
            .greeting(GREETING)
            .on("show slot *", "show slot *\nA...more? y=[yes]")
            .on("y", "B\nNE-1# ");
        let mut session = open(transport, log).await;

        let entry = session.execute("show slot *").await.unwrap();

        assert_eq!(entry.stdout, "AB");
        let sent = &session.transport().unwrap().sent;
        assert_eq!(sent.iter().filter(|s| s.as_str() == "y").count(), 1);
        assert_eq!(sent.last().unwrap(), "y");
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_prompt_without_echo_keeps_reading() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let transport = ScriptedTransport::new()
            .greeting(GREETING)
            .on("show alarms", "NE-1# ");
        let mut session = open(transport, log).await;

        let result = session.execute("show alarms").await;
        assert!(matches!(
            result,
            Err(Error::Session(SessionError::CommandExecution { .. }))
        ));
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_without_echo_verification() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let transport = ScriptedTransport::new()
            .greeting(GREETING)
            .on("paging off", "paging: off\nNE-1# ");
        let mut session = open(transport, log).await;

        let command = Command::new("paging off").with_verify_echo(false);
        let entry = session.execute(command).await.unwrap();
        assert_eq!(entry.stdout, "paging: off");
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_with_prompt_override() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let transport = ScriptedTransport::new()
            .greeting(GREETING)
            .on("restart", "restart\nProceed? [confirm]");
        let mut session = open(transport, log).await;

        let command = Command::new("restart").with_prompt(r"\[confirm\]").unwrap();
        let entry = session.execute(command).await.unwrap();
        assert_eq!(entry.stdout, "Proceed? ");
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let mut session = open(ScriptedTransport::new().greeting(GREETING), log.clone()).await;

        let err = session.execute("show xc *").await.unwrap_err();
        match err {
            Error::Session(SessionError::CommandExecution { command, source, .. }) => {
                assert_eq!(command, "show xc *");
                assert!(source.is_timeout());
            }
            other => panic!("unexpected error: {other}"),
        }

        session.close().await.unwrap();
        let entries = read_log(&log);
        let failed = entries.iter().find(|e| e["stdin"] == "ne1: show xc *").unwrap();
        assert_eq!(failed["stdin"], "ne1: show xc *");
        assert_eq!(failed["stdout"], FAILED_OUTPUT);
        assert!(!failed["stderr"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dead_connection_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let transport = ScriptedTransport::new().greeting(GREETING).disconnected();
        let mut session = open(transport, log.clone()).await;

        let entry = session.execute("show version").await.unwrap();

        assert_eq!(entry.stdin, "is_alive()");
        assert_eq!(entry.stderr, "abnormal connection closure");
        assert_eq!(entry.duration, 0.0);
        assert!(session.transport().unwrap().sent.is_empty());
        assert_eq!(records(&log), 2);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_session_records_closure() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let mut session = open(ScriptedTransport::new().greeting(GREETING), log.clone()).await;

        session.close().await.unwrap();
        session.close().await.unwrap();
        assert!(!session.is_alive());
        assert_eq!(records(&log), 2);

        let entry = session.execute("show version").await.unwrap();
        assert_eq!(entry.stderr, "abnormal connection closure");
    }

    #[tokio::test]
    async fn test_verify_prompt_switches_role() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let transport = ScriptedTransport::new()
            .greeting(GREETING)
            .on("", "\nroot@ne1:~# ");
        let mut session = open(transport, log).await;

        assert!(session.verify_prompt(Role::Root).await);
        assert_eq!(session.role(), Role::Root);
        assert_eq!(session.domain(), Domain::Root);
        assert_eq!(session.prompt(), "root@ne1:~#");

        session.reset_role();
        assert_eq!(session.role(), Role::Admin);
        assert_eq!(session.prompt(), "NE-1#");
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_verify_prompt_mismatch_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let transport = ScriptedTransport::new()
            .greeting(GREETING)
            .on("", "\nNE-1# ");
        let mut session = open(transport, log).await;

        assert!(!session.verify_prompt(Role::Root).await);
        assert_eq!(session.role(), Role::Admin);
        assert_eq!(session.prompt(), "");

        // No reply queued: verification times out.
        assert!(!session.verify_prompt(Role::Admin).await);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_login_verification_comments() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let transport = ScriptedTransport::new()
            .greeting(GREETING)
            .on("", "\nNE-1# ");
        let mut session = open(transport, log.clone()).await;

        assert!(session.login_verification(Role::Admin).await);
        session.close().await.unwrap();

        let entries = read_log(&log);
        let comment = entries.iter().find(|e| e["kind"] == "comment").unwrap();
        assert_eq!(comment["kind"], "comment");
        assert!(comment["stdin"].as_str().unwrap().contains("admin login verified"));
    }

    #[tokio::test]
    async fn test_timezone_probe() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let transport = ScriptedTransport::new()
            .greeting(GREETING)
            .on("date", "date\nTue Oct 19 10:00:00 UTC 2026\nNE-1# ")
            .on("show version", "show version\nVersion 1.0\nNE-1# ");
        let config = SessionBuilder::new("ne1")
            .role(Role::Admin)
            .port(22)
            .read_timeout(Duration::from_millis(50))
            .build();

        let mut session = Session::open(&ScriptedConnector::new(transport), config, log.clone())
            .await
            .unwrap();
        assert_eq!(records(&log), 1);

        let entry = session.execute("show version").await.unwrap();
        assert_eq!(entry.timezone_ne, "UTC");
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_secondary_host_tags_entries() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let transport = ScriptedTransport::new()
            .greeting(GREETING)
            .on("show version", "show version\nVersion 1.0\nNE-1# ");
        let mut session = open(transport, log).await;

        session.set_secondary_host(Some("10.0.0.2".to_string()));
        let entry = session.execute("show version").await.unwrap();
        assert_eq!(entry.secondary_host.as_deref(), Some("10.0.0.2"));
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_all_records_each() {
        let dir = tempfile::tempdir().unwrap();
        let log = shared_log(dir.path());
        let transport = ScriptedTransport::new()
            .greeting(GREETING)
            .on("show version", "show version\nVersion 1.0\nNE-1# ")
            .on("uptime", "uptime\nup 3 days\nNE-1# ");
        let mut session = open(transport, log.clone()).await;

        let entries = session.execute_all(["show version", "uptime"]).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].stdout, "up 3 days");
        session.close().await.unwrap();

        let entries = read_log(&log);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[3]["stdin"], "close()");
        assert_eq!(entries[3]["stdout"], "Disconnected: ne1");
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Tue Oct 19 10:00:00 CEST 2026"), Some("CEST"));
        assert_eq!(parse_timezone("date: not found"), None);
    }
}
