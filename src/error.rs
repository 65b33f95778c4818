//! Error types for the streaming edit engine
//!
//! Every failure mode the engine can surface is a distinct variant, so
//! callers can match on what went wrong instead of parsing messages.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for edit operations
pub type EditResult<T> = Result<T, EditError>;

/// Errors that can occur while compiling rules or driving a stream edit
#[derive(Error, Debug)]
pub enum EditError {
    /// Malformed options detected at the boundary (the TypeError class)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A search pattern failed to compile
    #[error("invalid search pattern /{pattern}/: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    /// The target path does not exist or is not a regular file
    #[error("file path '{path}' is invalid: {reason}")]
    InvalidFile { path: PathBuf, reason: String },

    /// The line buffer grew past the configured maximum without the
    /// separator ever matching. Usually a separator misconfiguration.
    #[error("maximum buffer length {limit} reached: ...{tail}")]
    BufferOverflow { limit: usize, tail: String },

    /// A rule with `min_times`/`required` matched fewer times than asked for
    #[error(
        "expected chunks to match the /{pattern}/ pattern at least {expected} times, \
         not {actual} times in actual fact"
    )]
    MinTimesUnmet {
        pattern: String,
        expected: usize,
        actual: usize,
    },

    /// A peer stream in a multi-stream topology went away before the
    /// operation finished
    #[error("{what} has been ended prematurely")]
    PrematureClose { what: &'static str },

    /// The operation was cancelled through its abort handle
    #[error("the operation was aborted")]
    Aborted,

    /// Propagated I/O failure from a source or destination
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl EditError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a `BufferOverflow` carrying the last ~90 chars of the
    /// offending buffer, clipped to a char boundary.
    pub fn buffer_overflow(limit: usize, buffer: &str) -> Self {
        const TAIL_CHARS: usize = 90;
        let start = buffer
            .char_indices()
            .rev()
            .take(TAIL_CHARS)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        Self::BufferOverflow {
            limit,
            tail: buffer[start..].to_string(),
        }
    }
}
