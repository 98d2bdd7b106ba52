//! Single valuation run

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use adapters::{merge, AdapterError, FetchOrchestrator};
use common::{Error, Result, Ticker};
use consensus::ConsensusEngine;
use observability::{Outcome, PipelineMetrics};
use publish::{SinkFanout, Snapshot};
use server::{HealthState, LastRun};
use strategies::{Evaluator, StrategyError};

use crate::report::RunReport;

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub snapshot: Snapshot,
    pub report: RunReport,
}

/// Fetch, merge, evaluate, aggregate and publish for a ticker set
pub struct Pipeline {
    orchestrator: FetchOrchestrator,
    evaluator: Evaluator,
    consensus: ConsensusEngine,
    sinks: SinkFanout,
    adapter_priority: Vec<String>,
    strategies: Vec<String>,
    metrics: PipelineMetrics,
    health: Option<Arc<HealthState>>,
}

impl Pipeline {
    pub fn new(
        orchestrator: FetchOrchestrator,
        evaluator: Evaluator,
        consensus: ConsensusEngine,
        sinks: SinkFanout,
        adapter_priority: Vec<String>,
        strategies: Vec<String>,
    ) -> Self {
        Self {
            orchestrator,
            evaluator,
            consensus,
            sinks,
            adapter_priority,
            strategies,
            metrics: PipelineMetrics::new(),
            health: None,
        }
    }

    /// Record each completed run on the `/health` endpoint
    pub fn with_health(mut self, health: Arc<HealthState>) -> Self {
        self.health = Some(health);
        self
    }

    pub fn adapter_priority(&self) -> &[String] {
        &self.adapter_priority
    }

    pub fn strategies(&self) -> &[String] {
        &self.strategies
    }

    pub fn sinks(&self) -> &SinkFanout {
        &self.sinks
    }

    /// Execute one run.
    ///
    /// Fails only for unregistered adapter/strategy names or a run cancelled
    /// before its calls were issued. Everything else ends up in the report.
    #[instrument(skip_all, fields(tickers = tickers.len()))]
    pub async fn run_once(&self, tickers: &[Ticker], cancel: &CancellationToken) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4().to_string();
        match self.execute(&run_id, tickers, cancel).await {
            Ok(outcome) => {
                self.metrics.run_completed(
                    outcome.report.duration,
                    outcome.report.records,
                    outcome.report.issues.len(),
                );
                if let Some(health) = &self.health {
                    health.record_run(LastRun {
                        run_id: outcome.report.run_id.clone(),
                        finished_at: Utc::now(),
                        records: outcome.report.records,
                        issues: outcome.report.issues.len(),
                    });
                }
                outcome.report.log();
                Ok(outcome)
            }
            Err(e) => {
                let outcome = match e {
                    Error::Cancelled => Outcome::Cancelled,
                    _ => Outcome::Failure,
                };
                self.metrics.run_failed(outcome);
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        run_id: &str,
        tickers: &[Ticker],
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        let started = Instant::now();
        let started_at = Utc::now();
        info!(run_id, tickers = tickers.len(), "Run started");

        let fetched = self
            .orchestrator
            .fetch(&self.adapter_priority, tickers, cancel)
            .await?;
        for adapter in &fetched.adapters {
            let outcome = match &adapter.result {
                Ok(_) => Outcome::Success,
                Err(AdapterError::Cancelled) => Outcome::Cancelled,
                Err(_) => Outcome::Failure,
            };
            self.metrics.adapter_fetch(&adapter.adapter, outcome);
        }
        let mut issues = fetched.issues;

        let merged = merge(tickers, &fetched.per_ticker);
        issues.extend(merged.issues);
        debug!(run_id, merged = merged.records.len(), "Merge complete");

        let evaluated = self
            .evaluator
            .evaluate(&self.strategies, &merged.records, cancel)
            .await?;
        for strategy in &evaluated.strategies {
            let outcome = match &strategy.result {
                Ok(_) => Outcome::Success,
                Err(StrategyError::Cancelled) => Outcome::Cancelled,
                Err(_) => Outcome::Failure,
            };
            self.metrics.strategy_eval(&strategy.strategy, outcome);
        }
        issues.extend(evaluated.issues);

        let consensus = self
            .consensus
            .run(&merged.records, &evaluated.results, &evaluated.categories);
        issues.extend(consensus.issues);

        let aggregator = self.consensus.aggregator();
        let snapshot = Snapshot::new(
            run_id,
            aggregator.mode(),
            aggregator.min_mos(),
            consensus.records,
            issues.clone(),
        );

        let mut sinks_ok = Vec::new();
        for outcome in self.sinks.publish(&snapshot).await {
            self.metrics
                .sink_publish(&outcome.sink, Outcome::from_success(outcome.is_success()));
            match outcome.issue() {
                Some(issue) => issues.push(issue),
                None => sinks_ok.push(outcome.sink),
            }
        }

        let report = RunReport {
            run_id: run_id.to_string(),
            started_at,
            duration: started.elapsed(),
            tickers_requested: tickers.len(),
            tickers_merged: merged.records.len(),
            records: snapshot.records.len(),
            undervalued: snapshot.records.iter().filter(|r| r.undervalued).count(),
            sinks_ok,
            issues,
        };
        Ok(RunOutcome { snapshot, report })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use adapters::{AdapterRegistry, MockAdapter, StaticAdapter};
    use async_trait::async_trait;
    use common::{AggregationMode, FieldValue};
    use consensus::{Aggregator, WeightingEngine};
    use parking_lot::Mutex;
    use publish::{Sink, SinkError};
    use std::time::Duration;
    use strategies::{
        GrahamNumber, MockScoringClient, PeterLynch, PriceToSalesReversion, RemoteStrategy,
        StrategyRegistry,
    };

    /// Sink that remembers every snapshot it saw
    #[derive(Default)]
    pub struct RecordingSink {
        pub seen: Mutex<Vec<Snapshot>>,
    }

    #[async_trait]
    impl Sink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn publish(&self, snapshot: &Snapshot) -> publish::Result<()> {
            self.seen.lock().push(snapshot.clone());
            Ok(())
        }
    }

    pub struct BrokenSink;

    #[async_trait]
    impl Sink for BrokenSink {
        fn name(&self) -> &str {
            "broken"
        }

        async fn publish(&self, _snapshot: &Snapshot) -> publish::Result<()> {
            Err(SinkError::Other("unreachable".into()))
        }
    }

    pub fn tickers(symbols: &[&str]) -> Vec<Ticker> {
        Ticker::parse_list(symbols).unwrap()
    }

    pub fn pipeline_with(
        adapters: AdapterRegistry,
        priority: &[&str],
        strategies: StrategyRegistry,
        names: &[&str],
        sinks: Vec<Arc<dyn Sink>>,
    ) -> Pipeline {
        Pipeline::new(
            FetchOrchestrator::new(Arc::new(adapters), Duration::from_secs(5)),
            Evaluator::new(Arc::new(strategies), Duration::from_secs(5)),
            ConsensusEngine::new(
                WeightingEngine::default(),
                Aggregator::new(AggregationMode::WeightedAverage, 0.2),
            ),
            SinkFanout::new(sinks),
            priority.iter().map(|s| s.to_string()).collect(),
            names.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn builtin_strategies() -> StrategyRegistry {
        StrategyRegistry::new()
            .with(PeterLynch::default())
            .with(PriceToSalesReversion::default())
            .with(GrahamNumber::default())
    }

    pub fn remote_peter_lynch(client: Arc<MockScoringClient>) -> RemoteStrategy {
        RemoteStrategy::new(
            "peter_lynch",
            common::StrategyCategory::GrowthSensitive,
            ["eps_ttm".to_string(), "growth_5y_est".to_string()].into(),
            client,
        )
    }

    pub fn vendor(name: &str, rows: &[(&str, &[(&str, f64)])]) -> StaticAdapter {
        rows.iter().fold(StaticAdapter::new(name), |adapter, (symbol, fields)| {
            adapter.with_record(
                Ticker::new(symbol).unwrap(),
                fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), Some(FieldValue::Number(*v)))),
            )
        })
    }

    pub fn mock_registry() -> AdapterRegistry {
        AdapterRegistry::new().with(MockAdapter::new())
    }
}
