//! Observability for fairval
//!
//! - Structured logging via `tracing` (pretty, json or compact output)
//! - Prometheus exporter and the pipeline metric set
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("fairval", LogFormat::Pretty)?;
//! observability::init_metrics("0.0.0.0:9090".parse()?)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, Outcome, PipelineMetrics};
