//! Fatal error types for fairval
//!
//! Only registry lookups for explicitly requested names, configuration
//! problems and run-level cancellation abort a run. Everything scoped to a
//! single adapter, strategy, ticker or sink is an [`Issue`](crate::Issue).

use thiserror::Error;

/// Error type for conditions that abort a whole run
#[derive(Error, Debug)]
pub enum Error {
    /// A requested adapter name is not registered
    #[error("Adapter not found: {0}")]
    AdapterNotFound(String),

    /// A requested strategy name is not registered
    #[error("Strategy not found: {0}")]
    StrategyNotFound(String),

    /// An output sink was requested that has no implementation
    #[error("Output sink '{0}' is not implemented")]
    SinkNotImplemented(String),

    /// Invalid input was provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run was cancelled before it could start issuing calls
    #[error("Run cancelled")]
    Cancelled,

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using the common Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for registry lookup failures of explicitly requested names
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, Self::AdapterNotFound(_) | Self::StrategyNotFound(_))
    }
}
