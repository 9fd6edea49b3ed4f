//! Scripted transport for exercising the session engine without a device.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use regex::Regex;

use super::config::ConnectTarget;
use super::{Connector, Transport};
use crate::channel::{Captured, PatternBuffer};
use crate::error::TransportError;

/// A transport that replies to each sent line with canned output.
///
/// Replies are queued per input line; sending a line with no queued reply
/// produces no output, so the next read times out immediately.
#[derive(Debug)]
pub(crate) struct ScriptedTransport {
    replies: HashMap<String, VecDeque<String>>,
    buffer: PatternBuffer,
    alive: bool,
    pub(crate) sent: Vec<String>,
    pub(crate) reads: usize,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            replies: HashMap::new(),
            buffer: PatternBuffer::new(usize::MAX),
            alive: true,
            sent: Vec::new(),
            reads: 0,
        }
    }

    /// Output already waiting on the channel (login banner and prompt).
    pub(crate) fn greeting(mut self, text: &str) -> Self {
        self.buffer.extend(text.as_bytes());
        self
    }

    /// Queue `reply` for the next time `input` is sent.
    pub(crate) fn on(mut self, input: &str, reply: &str) -> Self {
        self.replies
            .entry(input.to_string())
            .or_default()
            .push_back(reply.to_string());
        self
    }

    pub(crate) fn disconnected(mut self) -> Self {
        self.alive = false;
        self
    }
}

impl Transport for ScriptedTransport {
    async fn send(&mut self, input: &str) -> Result<(), TransportError> {
        if !self.alive {
            return Err(TransportError::Disconnected);
        }
        self.sent.push(input.to_string());
        if let Some(reply) = self.replies.get_mut(input).and_then(VecDeque::pop_front) {
            self.buffer.extend(reply.as_bytes());
        }
        Ok(())
    }

    async fn receive_until(
        &mut self,
        pattern: &Regex,
        timeout: Duration,
    ) -> Result<Captured, TransportError> {
        self.reads += 1;
        self.buffer
            .capture(pattern)
            .ok_or(TransportError::Timeout(timeout))
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    async fn close(self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Hands out one prepared [`ScriptedTransport`], or fails authentication.
pub(crate) struct ScriptedConnector {
    transport: Mutex<Option<ScriptedTransport>>,
}

impl ScriptedConnector {
    pub(crate) fn new(transport: ScriptedTransport) -> Self {
        Self {
            transport: Mutex::new(Some(transport)),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            transport: Mutex::new(None),
        }
    }
}

impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    async fn connect(&self, target: &ConnectTarget) -> Result<ScriptedTransport, TransportError> {
        let transport = self.transport.lock().unwrap().take();
        transport.ok_or_else(|| TransportError::AuthenticationFailed {
            user: target.username.clone(),
        })
    }
}
