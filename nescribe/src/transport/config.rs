//! Connection configuration and role lookups.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::session::Role;

/// Port used when no role-specific port is configured.
pub const DEFAULT_PORT: u16 = 22;

/// What a connector needs to open a transport.
#[derive(Debug, Clone)]
pub struct ConnectTarget {
    /// Target host (hostname or IP address).
    pub host: String,

    /// Port to connect to.
    pub port: u16,

    /// Login name.
    pub username: String,

    /// Password, if any.
    pub credential: Option<SecretString>,

    /// Connection and authentication timeout.
    pub timeout: Duration,
}

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For testing and lab use only.
    Disabled,
}

/// SSH connection configuration.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port.
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Connection timeout.
    pub timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,

    /// Line terminator appended to every sent line.
    pub line_ending: String,
}

impl SshConfig {
    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication method for SSH connections.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// No authentication (for testing only).
    None,

    /// Password authentication.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<String>,
    },
}

/// Port for `role`, from `NE_<ROLE>_PORT` or [`DEFAULT_PORT`].
pub fn get_port(role: Role) -> u16 {
    port_with(role, |key| std::env::var(key).ok())
}

/// Credential for `role`, from `NE_<ROLE>_PASSWORD`.
pub fn get_credential(role: Role) -> Option<SecretString> {
    credential_with(role, |key| std::env::var(key).ok())
}

fn port_with(role: Role, lookup: impl Fn(&str) -> Option<String>) -> u16 {
    lookup(&format!("NE_{}_PORT", role.env_key()))
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn credential_with(role: Role, lookup: impl Fn(&str) -> Option<String>) -> Option<SecretString> {
    lookup(&format!("NE_{}_PASSWORD", role.env_key())).map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_port_lookup() {
        let env = vars(&[("NE_ADMIN_PORT", "2022"), ("NE_ROOT_PORT", "bogus")]);
        let lookup = |key: &str| env.get(key).cloned();

        assert_eq!(port_with(Role::Admin, lookup), 2022);
        assert_eq!(port_with(Role::Root, lookup), DEFAULT_PORT);
        assert_eq!(port_with(Role::DbgCutThru, lookup), DEFAULT_PORT);
    }

    #[test]
    fn test_credential_lookup() {
        let env = vars(&[("NE_ROOT_PASSWORD", "s3cret")]);
        let lookup = |key: &str| env.get(key).cloned();

        let secret = credential_with(Role::Root, lookup).unwrap();
        assert_eq!(secret.expose_secret(), "s3cret");
        assert!(credential_with(Role::Admin, lookup).is_none());
    }
}
