use async_trait::async_trait;

use crate::error::Result;
use crate::snapshot::Snapshot;

/// Destination for a run's results
///
/// An empty `records` list is a normal input and must be rendered as such.
#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    async fn publish(&self, snapshot: &Snapshot) -> Result<()>;
}
