//! Health endpoint
//!
//! Reports liveness plus a short summary of the most recent pipeline run.

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Summary of the latest completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastRun {
    pub run_id: String,
    pub finished_at: DateTime<Utc>,
    pub records: usize,
    pub issues: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub runs_completed: u64,
    pub last_run: Option<LastRun>,
}

/// Shared state behind `/health`
#[derive(Debug)]
pub struct HealthState {
    service_name: String,
    start_time: Instant,
    runs: RwLock<(u64, Option<LastRun>)>,
}

impl HealthState {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            start_time: Instant::now(),
            runs: RwLock::new((0, None)),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn record_run(&self, run: LastRun) {
        let mut runs = self.runs.write();
        runs.0 += 1;
        runs.1 = Some(run);
    }

    pub fn status(&self) -> HealthStatus {
        let (runs_completed, last_run) = self.runs.read().clone();
        HealthStatus {
            status: "ok".to_string(),
            service: self.service_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now().to_rfc3339(),
            uptime_seconds: self.uptime_seconds(),
            runs_completed,
            last_run,
        }
    }
}

pub async fn health_handler(State(state): State<Arc<HealthState>>) -> Json<HealthStatus> {
    Json(state.status())
}

/// `GET /health`
pub fn health_routes(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_tracks_runs() {
        let state = HealthState::new("fairval");
        let status = state.status();
        assert_eq!(status.status, "ok");
        assert_eq!(status.runs_completed, 0);
        assert!(status.last_run.is_none());

        state.record_run(LastRun {
            run_id: "r1".into(),
            finished_at: Utc::now(),
            records: 3,
            issues: 1,
        });
        state.record_run(LastRun {
            run_id: "r2".into(),
            finished_at: Utc::now(),
            records: 4,
            issues: 0,
        });

        let status = state.status();
        assert_eq!(status.runs_completed, 2);
        assert_eq!(status.last_run.map(|r| r.run_id), Some("r2".to_string()));
    }
}
