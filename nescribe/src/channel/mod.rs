//! Channel layer for prompt detection.
//!
//! This module holds the pattern buffer used by transports and the
//! prompt catalogue and text helpers used by the session engine.

mod buffer;
pub mod patterns;

pub use buffer::{Captured, PatternBuffer};
pub use patterns::{CONTINUATION, CONTINUATION_PROMPT, GENERIC, GENERIC_PROMPT};
