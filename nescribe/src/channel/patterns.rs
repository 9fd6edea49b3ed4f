//! Prompt patterns and text helpers for prompt detection.

use std::sync::LazyLock;

use regex::Regex;

/// Pager prompt shown when more output pages remain.
pub const CONTINUATION_PROMPT: &str = r"\.\.\.more\? y=\[yes\]";

/// Permissive prompt used when the observed prompt could not be verified.
pub const GENERIC_PROMPT: &str = r"[#~>$]\s*$";

/// Compiled continuation prompt.
pub static CONTINUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CONTINUATION_PROMPT).expect("continuation prompt is valid"));

/// Compiled generic prompt.
pub static GENERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(GENERIC_PROMPT).expect("generic prompt is valid"));

/// Compile a prompt pattern string into a regex.
///
/// Anchors to end of input if no anchor is specified.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!("{}\\s*$", pattern)
    };

    Regex::new(&pattern)
}

/// Build a pattern source matching an observed prompt literally at end of input.
///
/// An empty prompt yields the generic prompt.
pub fn literal_prompt(observed: &str) -> String {
    let observed = observed.trim();
    if observed.is_empty() {
        GENERIC_PROMPT.to_string()
    } else {
        format!("{}\\s*$", regex::escape(observed))
    }
}

/// Combine several patterns into one alternation.
pub fn union(patterns: &[&str]) -> Result<Regex, regex::Error> {
    let combined = patterns
        .iter()
        .map(|p| format!("(?:{})", p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&combined)
}

/// Strip terminal control and escape sequences.
pub fn strip_escapes(text: &str) -> String {
    strip_ansi_escapes::strip_str(text)
}

/// The last non-empty line of `text`, trimmed.
pub fn prompt_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or("")
}
