//! Prometheus metrics
//!
//! | metric | type | labels |
//! |---|---|---|
//! | `fairval_adapter_fetch_total` | counter | adapter, outcome |
//! | `fairval_strategy_eval_total` | counter | strategy, outcome |
//! | `fairval_sink_publish_total` | counter | sink, outcome |
//! | `fairval_runs_total` | counter | outcome |
//! | `fairval_run_duration_seconds` | histogram | |
//! | `fairval_consensus_records` | gauge | |
//! | `fairval_run_issues` | gauge | |

use metrics::{counter, gauge, histogram, Gauge, Histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Start the Prometheus exporter serving `/metrics` on `addr`
pub fn init_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Label value for success/failure counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    Cancelled,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Cancelled => "cancelled",
        }
    }

    pub fn from_success(ok: bool) -> Self {
        if ok {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

/// Metric handles for one pipeline instance
#[derive(Clone)]
pub struct PipelineMetrics {
    run_duration: Histogram,
    consensus_records: Gauge,
    run_issues: Gauge,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            run_duration: histogram!("fairval_run_duration_seconds"),
            consensus_records: gauge!("fairval_consensus_records"),
            run_issues: gauge!("fairval_run_issues"),
        }
    }

    pub fn adapter_fetch(&self, adapter: &str, outcome: Outcome) {
        counter!(
            "fairval_adapter_fetch_total",
            "adapter" => adapter.to_string(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
    }

    pub fn strategy_eval(&self, strategy: &str, outcome: Outcome) {
        counter!(
            "fairval_strategy_eval_total",
            "strategy" => strategy.to_string(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
    }

    pub fn sink_publish(&self, sink: &str, outcome: Outcome) {
        counter!(
            "fairval_sink_publish_total",
            "sink" => sink.to_string(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
    }

    /// Record a finished run
    pub fn run_completed(&self, duration: Duration, records: usize, issues: usize) {
        counter!("fairval_runs_total", "outcome" => Outcome::Success.as_str()).increment(1);
        self.run_duration.record(duration.as_secs_f64());
        self.consensus_records.set(records as f64);
        self.run_issues.set(issues as f64);
    }

    /// Record a run that aborted
    pub fn run_failed(&self, outcome: Outcome) {
        counter!("fairval_runs_total", "outcome" => outcome.as_str()).increment(1);
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::from_success(true).as_str(), "success");
        assert_eq!(Outcome::from_success(false).as_str(), "failure");
        assert_eq!(Outcome::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_recording_without_exporter_is_noop() {
        let metrics = PipelineMetrics::new();
        metrics.adapter_fetch("mock", Outcome::Success);
        metrics.strategy_eval("peter_lynch", Outcome::Failure);
        metrics.sink_publish("console", Outcome::Success);
        metrics.run_completed(Duration::from_millis(120), 3, 1);
        metrics.run_failed(Outcome::Cancelled);
    }
}
