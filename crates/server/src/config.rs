//! Listener configuration

use crate::error::{Result, ServerError};
use std::net::SocketAddr;

/// Default listener ports
pub mod ports {
    /// Results API (REST + WebSocket)
    pub const RESULTS_HTTP: u16 = 8080;
}

/// Where an HTTP listener binds
///
/// Port `0` asks the OS for an ephemeral port; the bound address is then
/// reported by [`Server::address`](crate::Server::address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Loopback on an ephemeral port
    pub fn ephemeral() -> Self {
        Self::new("127.0.0.1", 0)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", ports::RESULTS_HTTP)
    }
}
