//! Sink selection and fan-out

use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use common::{Error, Issue};

use crate::error::SinkError;
use crate::sink::Sink;
use crate::sinks::{ConsoleSink, HttpSnapshotSink, JsonFileSink, UdpBroadcastSink};
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;

/// Output modes with an implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Console,
    Json,
    Http,
    Broadcast,
}

impl SinkKind {
    /// Parse an output mode name.
    ///
    /// `gui` is a known mode without an implementation and is reported as
    /// [`Error::SinkNotImplemented`].
    pub fn parse(mode: &str) -> common::Result<Self> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "console" => Ok(SinkKind::Console),
            "json" => Ok(SinkKind::Json),
            "http" => Ok(SinkKind::Http),
            "broadcast" => Ok(SinkKind::Broadcast),
            "gui" => Err(Error::SinkNotImplemented("gui".to_string())),
            other => Err(Error::config(format!("unknown output mode '{}'", other))),
        }
    }
}

/// Inputs needed to construct sinks from mode names
#[derive(Debug, Clone)]
pub struct SinkSettings {
    pub console_limit: usize,
    pub json_path: PathBuf,
    /// `host:port` for the broadcast sink
    pub broadcast_target: Option<String>,
    /// Store served by the results API; required by the `http` mode
    pub store: Option<Arc<SnapshotStore>>,
}

/// How one sink's publish went
#[derive(Debug)]
pub struct SinkOutcome {
    pub sink: String,
    pub elapsed: Duration,
    pub result: Result<(), SinkError>,
}

impl SinkOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn issue(&self) -> Option<Issue> {
        self.result
            .as_ref()
            .err()
            .map(|e| Issue::sink_publish(&self.sink, e))
    }
}

/// Publishes one snapshot to every sink independently
#[derive(Clone, Default)]
pub struct SinkFanout {
    sinks: Vec<Arc<dyn Sink>>,
}

impl SinkFanout {
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    /// Build one sink per distinct mode, in the order given
    pub fn from_modes(modes: &[String], settings: &SinkSettings) -> common::Result<Self> {
        let mut kinds = Vec::new();
        for mode in modes {
            let kind = SinkKind::parse(mode)?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }

        let mut sinks: Vec<Arc<dyn Sink>> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let sink: Arc<dyn Sink> = match kind {
                SinkKind::Console => Arc::new(ConsoleSink::new(settings.console_limit)),
                SinkKind::Json => Arc::new(JsonFileSink::new(&settings.json_path)),
                SinkKind::Http => {
                    let store = settings.store.clone().ok_or_else(|| {
                        Error::config("http output requires the results server")
                    })?;
                    Arc::new(HttpSnapshotSink::new(store))
                }
                SinkKind::Broadcast => {
                    let target = settings.broadcast_target.clone().ok_or_else(|| {
                        Error::config("broadcast output requires a host and port")
                    })?;
                    Arc::new(UdpBroadcastSink::new(target))
                }
            };
            sinks.push(sink);
        }
        Ok(Self { sinks })
    }

    pub fn names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Publish to all sinks concurrently; outcomes follow sink order
    pub async fn publish(&self, snapshot: &Snapshot) -> Vec<SinkOutcome> {
        let futures = self.sinks.iter().map(|sink| async move {
            let start = Instant::now();
            let result = sink.publish(snapshot).await;
            let outcome = SinkOutcome {
                sink: sink.name().to_string(),
                elapsed: start.elapsed(),
                result,
            };
            match &outcome.result {
                Ok(()) => debug!(sink = %outcome.sink, elapsed_ms = outcome.elapsed.as_millis() as u64, "Published"),
                Err(e) => warn!(sink = %outcome.sink, error = %e, "Sink publish failed"),
            }
            outcome
        });
        join_all(futures).await
    }
}

impl std::fmt::Debug for SinkFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkFanout")
            .field("sinks", &self.names())
            .finish()
    }
}
