use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;
use crate::sink::Sink;
use crate::snapshot::Snapshot;

/// Writes the snapshot as pretty JSON, replacing the file atomically
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl Sink for JsonFileSink {
    fn name(&self) -> &str {
        "json"
    }

    async fn publish(&self, snapshot: &Snapshot) -> Result<()> {
        let body = serde_json::to_vec_pretty(snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = ?self.path, bytes = body.len(), "Snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fixtures::{record, snapshot};
    use crate::SinkError;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_writes_snapshot_and_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("fair_values.json");
        let sink = JsonFileSink::new(&path);

        sink.publish(&snapshot(vec![record("AAPL", Some(1.0), 2.0)])).await.unwrap();
        sink.publish(&snapshot(Vec::new())).await.unwrap();

        let written: Snapshot =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(written.records.is_empty());
        assert_eq!(written.schema_version, 1);
        assert!(!sink.temp_path().exists());
    }

    #[tokio::test]
    async fn test_unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let sink = JsonFileSink::new(blocker.join("nested.json"));
        assert_matches!(sink.publish(&snapshot(Vec::new())).await, Err(SinkError::Io(_)));
    }
}
