//! Error types for the word layer.

use std::time::Duration;

/// Reasons a Word Oracle lookup can fail.
///
/// These never reach the room coordinator: [`crate::ResilientOracle`]
/// swaps any of them for a fallback word and logs the cause.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The oracle did not answer within the configured timeout.
    #[error("word oracle timed out after {0:?}")]
    Timeout(Duration),

    /// The answer was empty after trimming.
    #[error("word oracle returned an empty word")]
    Empty,

    /// The answer was longer than the configured maximum.
    #[error("word oracle returned {len} characters (max {max})")]
    TooLong { len: usize, max: usize },

    /// The backing service failed.
    #[error("word oracle backend failed: {0}")]
    Backend(String),
}
