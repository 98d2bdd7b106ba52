//! Adapter error types

use std::time::Duration;
use thiserror::Error;

/// Errors a single adapter invocation can produce
///
/// Always scoped to one adapter; the orchestrator turns them into issues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// Upstream source could not be reached or refused the request
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded the per-adapter timeout
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Upstream returned data that could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Run was cancelled before this adapter was called
    #[error("Skipped: run cancelled")]
    Cancelled,

    /// The adapter task panicked
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;
