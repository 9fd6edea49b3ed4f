//! Per-call command options.

use std::time::Duration;

use regex::Regex;

/// A command to execute, with optional per-call overrides.
///
/// # Example
///
/// ```rust
/// use nescribe::session::Command;
/// use std::time::Duration;
///
/// let command = Command::new("show xc *")
///     .with_prompt(r"NE-1#\s*$")
///     .unwrap()
///     .with_timeout(Duration::from_secs(120));
/// assert_eq!(command.text, "show xc *");
/// ```
#[derive(Debug, Clone)]
pub struct Command {
    /// Command text, sent verbatim.
    pub text: String,

    /// Completion pattern replacing the session's default prompt.
    pub prompt: Option<Regex>,

    /// Response timeout replacing the session's read timeout.
    pub timeout: Option<Duration>,

    /// Require the command echo before accepting completion.
    pub verify_echo: bool,
}

impl Command {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            prompt: None,
            timeout: None,
            verify_echo: true,
        }
    }

    /// Wait for `pattern` instead of the session's default prompt.
    pub fn with_prompt(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.prompt = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_verify_echo(mut self, verify_echo: bool) -> Self {
        self.verify_echo = verify_echo;
        self
    }
}

impl From<&str> for Command {
    fn from(text: &str) -> Self {
        Command::new(text)
    }
}

impl From<String> for Command {
    fn from(text: String) -> Self {
        Command::new(text)
    }
}
