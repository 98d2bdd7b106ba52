//! Data-source layer of the valuation pipeline
//!
//! - [`Adapter`] - capability interface for a data source
//! - [`AdapterRegistry`] - name to adapter lookup, built once at startup
//! - [`FetchOrchestrator`] - drives the requested adapters concurrently
//! - [`merge`] - first-non-null-wins merge in adapter priority order
//!
//! Built-in sources are [`MockAdapter`] and [`StaticAdapter`].

pub mod adapter;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod mock;
pub mod registry;
pub mod static_source;

pub use adapter::Adapter;
pub use error::{AdapterError, Result};
pub use fetch::{AdapterOutcome, FetchOrchestrator, FetchOutcome, SourcedRecord};
pub use merge::{merge, MergeOutcome};
pub use mock::MockAdapter;
pub use registry::AdapterRegistry;
pub use static_source::StaticAdapter;
