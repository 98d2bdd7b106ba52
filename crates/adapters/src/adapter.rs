//! Adapter trait

use async_trait::async_trait;
use std::collections::BTreeSet;

use common::{RawRecord, Ticker};

use crate::error::Result;

/// A pluggable data source supplying a partial field set per ticker
///
/// Implementations hold only their own client state; the orchestrator may
/// call different adapters concurrently.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Unique registry name
    fn name(&self) -> &str;

    /// Fields this adapter may supply (informational)
    fn fields(&self) -> BTreeSet<String>;

    /// Fetch records for `tickers`.
    ///
    /// Tickers the source knows nothing about are simply left out of the
    /// returned records.
    async fn fetch(&self, tickers: &[Ticker]) -> Result<Vec<RawRecord>>;
}
