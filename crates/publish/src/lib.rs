//! Result publication for fairval
//!
//! A run's consensus records are wrapped in a versioned [`Snapshot`] and
//! handed to every configured [`Sink`] through a [`SinkFanout`]. A failing
//! sink is reported as an issue and never stops the others.
//!
//! # Sinks
//!
//! - [`ConsoleSink`] - sorted table plus the most undervalued tickers
//! - [`JsonFileSink`] - pretty JSON snapshot written atomically
//! - [`HttpSnapshotSink`] - feeds the results API (`/results`, `/stream`)
//! - [`UdpBroadcastSink`] - compact JSON datagram

pub mod api;
pub mod error;
pub mod fanout;
pub mod sink;
pub mod sinks;
pub mod snapshot;
pub mod store;

pub use api::{results_router, ResultsQuery};
pub use error::{Result, SinkError};
pub use fanout::{SinkFanout, SinkKind, SinkOutcome, SinkSettings};
pub use sink::Sink;
pub use sinks::{ConsoleSink, HttpSnapshotSink, JsonFileSink, UdpBroadcastSink};
pub use snapshot::{Snapshot, SCHEMA_VERSION};
pub use store::SnapshotStore;
