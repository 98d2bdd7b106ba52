use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::sink::Sink;
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;

/// Hands snapshots to the results API
pub struct HttpSnapshotSink {
    store: Arc<SnapshotStore>,
}

impl HttpSnapshotSink {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Sink for HttpSnapshotSink {
    fn name(&self) -> &str {
        "http"
    }

    async fn publish(&self, snapshot: &Snapshot) -> Result<()> {
        self.store.publish(snapshot.clone());
        Ok(())
    }
}
