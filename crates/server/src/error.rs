//! Listener errors

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Cannot listen on {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Host/port pair that does not parse as a socket address
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ServerError {
    pub fn bind(address: impl Into<String>, source: io::Error) -> Self {
        Self::BindError {
            address: address.into(),
            source,
        }
    }

    /// The port is already taken by another process
    pub fn is_port_in_use(&self) -> bool {
        matches!(
            self,
            Self::BindError { source, .. } if source.kind() == io::ErrorKind::AddrInUse
        )
    }
}
