//! Pattern buffer with tail-search prompt detection.
//!
//! Only the last N bytes of the buffer are searched for prompt patterns,
//! which keeps prompt detection cheap for very large command outputs.

use regex::Regex;

/// Text read from a channel up to and including a matched pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    /// Everything received before the match.
    pub before: String,

    /// The text that matched the pattern.
    pub matched: String,
}

impl Captured {
    /// The full captured chunk (`before` followed by `matched`).
    pub fn text(&self) -> String {
        format!("{}{}", self.before, self.matched)
    }
}

/// Longest escape sequence held back waiting for its final byte.
const MAX_ESCAPE_LEN: usize = 64;

/// Start of a trailing escape sequence in `bytes` still missing its final
/// byte.
fn incomplete_escape(bytes: &[u8]) -> Option<usize> {
    let start = bytes.iter().rposition(|&b| b == 0x1b)?;
    if bytes.len() - start > MAX_ESCAPE_LEN {
        return None;
    }

    let rest = &bytes[start + 1..];
    let complete = match rest.first() {
        None => false,
        // CSI: parameters and intermediates until a final byte in 0x40..=0x7e
        Some(b'[') => rest[1..].iter().any(|b| (0x40..=0x7e).contains(b)),
        // OSC: terminated by BEL (an ST terminator is itself an escape)
        Some(b']') => rest[1..].contains(&0x07),
        Some(_) => true,
    };
    (!complete).then_some(start)
}

/// Buffer for accumulating channel output and searching it for patterns.
///
/// Incoming bytes are stripped of terminal escape sequences and decoded
/// as UTF-8. A multi-byte character or an escape sequence split across two
/// reads is held back until its remaining bytes arrive.
#[derive(Debug)]
pub struct PatternBuffer {
    /// Decoded, escape-free text not yet handed out.
    text: String,

    /// Trailing bytes of an incomplete UTF-8 sequence.
    carry: Vec<u8>,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            text: String::with_capacity(4096),
            carry: Vec::new(),
            search_depth,
        }
    }

    /// Extend the buffer with raw channel data.
    pub fn extend(&mut self, data: &[u8]) {
        self.carry.extend_from_slice(data);

        let mut ready = match std::str::from_utf8(&self.carry) {
            Ok(_) => self.carry.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => self.carry.len(),
        };
        if let Some(start) = incomplete_escape(&self.carry[..ready]) {
            ready = start;
        }
        let bytes: Vec<u8> = self.carry.drain(..ready).collect();

        let cleaned = strip_ansi_escapes::strip(&bytes);
        self.text.push_str(&String::from_utf8_lossy(&cleaned));
    }

    /// Search the tail of the buffer and, on a match, remove everything up
    /// to the end of the match.
    ///
    /// Data after the match stays buffered for the next read.
    pub fn capture(&mut self, pattern: &Regex) -> Option<Captured> {
        let start = self.tail_start();
        let m = pattern.find(&self.text[start..])?;
        let (match_start, match_end) = (start + m.start(), start + m.end());

        let rest = self.text.split_off(match_end);
        let mut taken = std::mem::replace(&mut self.text, rest);
        let matched = taken.split_off(match_start);

        Some(Captured {
            before: taken,
            matched,
        })
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        pattern.is_match(&self.text[self.tail_start()..])
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    /// Get the buffered text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Get the current buffer length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.text.clear();
        self.carry.clear();
    }

    fn tail_start(&self) -> usize {
        let mut start = self.text.len().saturating_sub(self.search_depth);
        while !self.text.is_char_boundary(start) {
            start += 1;
        }
        start
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
