//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, trace, warn};
use regex::Regex;
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::config::{AuthMethod, ConnectTarget, HostKeyVerification, SshConfig};
use super::{Connector, Transport};
use crate::channel::{Captured, PatternBuffer};
use crate::error::TransportError;

/// SSH transport wrapping a russh client session and one PTY shell channel.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Interactive shell channel.
    channel: Channel<Msg>,

    /// Output received but not yet consumed.
    buffer: PatternBuffer,

    /// Cleared once the remote side closes the channel.
    open: bool,

    /// Configuration used for this connection.
    config: SshConfig,
}

impl SshTransport {
    /// Connect to the SSH server, authenticate and open a shell.
    pub async fn connect(config: SshConfig) -> Result<Self, TransportError> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.timeout),
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        debug!("connecting to {}", config.socket_addr());
        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|e| {
            // Prefer the detailed host key error over russh's generic one
            let stored = host_key_error
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .take();
            stored.unwrap_or(TransportError::Ssh(e))
        })?;

        tokio::time::timeout(config.timeout, Self::authenticate(&mut session, &config))
            .await
            .map_err(|_| TransportError::Timeout(config.timeout))??;

        let channel = Self::open_channel(&session, &config).await?;
        info!("connected to {} as {}", config.socket_addr(), config.username);

        Ok(Self {
            session,
            channel,
            buffer: PatternBuffer::default(),
            open: true,
            config,
        })
    }

    /// Open a PTY shell channel on this connection.
    async fn open_channel(
        session: &Handle<SshHandler>,
        config: &SshConfig,
    ) -> Result<Channel<Msg>, TransportError> {
        let channel = session.channel_open_session().await?;

        channel
            .request_pty(
                true,
                "xterm",
                config.terminal_width,
                config.terminal_height,
                0,
                0,
                &[],
            )
            .await?;

        channel.request_shell(true).await?;

        Ok(channel)
    }

    /// Authenticate with the server.
    async fn authenticate(
        session: &mut Handle<SshHandler>,
        config: &SshConfig,
    ) -> Result<(), TransportError> {
        let success = match &config.auth {
            AuthMethod::None => session
                .authenticate_none(&config.username)
                .await?
                .success(),
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await?
                .success(),
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_deref())
                    .map_err(|e| TransportError::Key(e.to_string()))?;

                let hash_alg = session.best_supported_rsa_hash().await?.flatten();

                session
                    .authenticate_publickey(
                        &config.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await?
                    .success()
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            });
        }

        Ok(())
    }

    /// Configuration used for this connection.
    pub fn config(&self) -> &SshConfig {
        &self.config
    }
}

impl Transport for SshTransport {
    async fn send(&mut self, input: &str) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Disconnected);
        }
        let line = format!("{}{}", input, self.config.line_ending);
        self.channel.data(line.as_bytes()).await?;
        Ok(())
    }

    async fn receive_until(
        &mut self,
        pattern: &Regex,
        timeout: Duration,
    ) -> Result<Captured, TransportError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some(captured) = self.buffer.capture(pattern) {
                return Ok(captured);
            }
            if !self.open {
                return Err(TransportError::Disconnected);
            }

            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| TransportError::Timeout(timeout))?;

            match msg {
                Some(ChannelMsg::Data { data }) => {
                    trace!("read {} bytes", data.len());
                    self.buffer.extend(&data[..]);
                }
                Some(ChannelMsg::ExtendedData { data, .. }) => {
                    trace!("read {} bytes (extended)", data.len());
                    self.buffer.extend(&data[..]);
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    debug!("channel to {} closed by peer", self.config.host);
                    self.open = false;
                }
                Some(_) => {}
            }
        }
    }

    fn is_alive(&self) -> bool {
        self.open && !self.session.is_closed()
    }

    async fn close(self) -> Result<(), TransportError> {
        if self.open {
            let _ = self.channel.eof().await;
        }
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await?;
        Ok(())
    }
}

/// Opens [`SshTransport`]s using password authentication.
#[derive(Debug, Clone)]
pub struct SshConnector {
    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Line terminator appended to every sent line.
    pub line_ending: String,
}

impl Default for SshConnector {
    fn default() -> Self {
        Self {
            host_key_verification: HostKeyVerification::AcceptNew,
            known_hosts_path: None,
            terminal_width: 511,
            terminal_height: 24,
            line_ending: "\n".to_string(),
        }
    }
}

impl SshConnector {
    /// Build the SSH configuration for a target.
    pub fn ssh_config(&self, target: &ConnectTarget) -> SshConfig {
        let auth = match &target.credential {
            Some(secret) => AuthMethod::Password(secret.clone()),
            None => AuthMethod::None,
        };

        SshConfig {
            host: target.host.clone(),
            port: target.port,
            username: target.username.clone(),
            auth,
            timeout: target.timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification.clone(),
            known_hosts_path: self.known_hosts_path.clone(),
            line_ending: self.line_ending.clone(),
        }
    }
}

impl Connector for SshConnector {
    type Transport = SshTransport;

    async fn connect(&self, target: &ConnectTarget) -> Result<SshTransport, TransportError> {
        SshTransport::connect(self.ssh_config(target)).await
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Detailed host key error surfaced by `connect()`.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Save a new host key to known_hosts.
    fn learn_host_key(&self, pubkey: &PublicKey) -> Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, error: TransportError) -> bool {
        *self
            .host_key_error
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(error);
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        match self.host_key_verification {
            HostKeyVerification::Disabled => Ok(true),

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key: {}", e);
                    }
                    Ok(true)
                }
                Err(e) => Ok(self.reject(e)),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => Ok(self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                })),
                Err(e) => Ok(self.reject(e)),
            },
        }
    }
}
