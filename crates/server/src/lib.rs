//! Server infrastructure for fairval
//!
//! Every listener implements [`Server`] and is stopped through a
//! `CancellationToken`. The binary owns one [`ShutdownController`] and hands
//! child tokens to the results API and the run loop.
//!
//! # Modules
//!
//! - [`config`] - listener address configuration
//! - [`traits`] - `Server` and `ServerExt`
//! - [`http`] - Axum HTTP server
//! - [`health`] - `/health` endpoint and run summary state
//! - [`shutdown`] - Ctrl+C handling

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod shutdown;
pub mod traits;

pub use config::{ports, ServerConfig};
pub use error::{Result, ServerError};
pub use health::{health_routes, HealthState, HealthStatus, LastRun};
pub use http::HttpServer;
pub use shutdown::ShutdownController;
pub use traits::{Server, ServerExt};
