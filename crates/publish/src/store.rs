//! Latest snapshot shared with the results API

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::snapshot::Snapshot;

const CHANNEL_CAPACITY: usize = 16;

/// Holds the most recent snapshot and pushes each new one to subscribers
#[derive(Debug)]
pub struct SnapshotStore {
    latest: RwLock<Option<Arc<Snapshot>>>,
    updates: broadcast::Sender<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            latest: RwLock::new(None),
            updates,
        }
    }

    pub fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        *self.latest.write() = Some(snapshot.clone());
        // No receivers is fine
        let receivers = self.updates.send(snapshot).unwrap_or(0);
        debug!(receivers, "Snapshot stored");
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Snapshot>> {
        self.updates.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fixtures::{record, snapshot};

    #[tokio::test]
    async fn test_publish_updates_latest_and_subscribers() {
        let store = SnapshotStore::new();
        assert!(store.latest().is_none());

        let mut rx = store.subscribe();
        store.publish(snapshot(vec![record("AAPL", Some(1.0), 2.0)]));

        let pushed = rx.recv().await.unwrap();
        assert_eq!(pushed.records.len(), 1);
        assert_eq!(store.latest().unwrap().run_id, "run-1");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let store = SnapshotStore::new();
        store.publish(snapshot(Vec::new()));
        assert!(store.latest().unwrap().is_empty());
    }
}
