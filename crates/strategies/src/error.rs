//! Strategy error types

use std::time::Duration;
use thiserror::Error;

/// Failure of a whole strategy batch
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    /// Scoring service could not be reached
    #[error("Scoring service unreachable: {0}")]
    Transport(String),

    /// Scoring service answered with a non-success status
    #[error("Scoring service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Invalid scoring response: {0}")]
    Decode(String),

    /// Batch exceeded the per-call timeout
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Batch was never sent because the run was cancelled
    #[error("Skipped: run cancelled")]
    Cancelled,

    /// The evaluation task panicked
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for strategy operations
pub type Result<T> = std::result::Result<T, StrategyError>;
