//! Strategy evaluation
//!
//! For every requested strategy the evaluator:
//! 1. splits the merged records into those defining every required field
//!    and those that do not (the latter decline with an input issue),
//! 2. hands the eligible batch to the strategy under a timeout,
//! 3. maps the batch outcome back onto every eligible ticker.
//!
//! Strategies run concurrently in their own tasks and write disjoint
//! result slots, so one strategy's failure never touches another's results.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use common::{Error, Issue, MergedRecord, Result, StrategyCategory, StrategyResult, Ticker};

use crate::error::StrategyError;
use crate::registry::StrategyRegistry;
use crate::strategy::Strategy;

/// How one strategy's batch went
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    pub strategy: String,
    pub category: StrategyCategory,
    pub elapsed: Duration,
    /// Tickers valued, or the batch failure
    pub result: std::result::Result<usize, StrategyError>,
}

#[derive(Debug, Default)]
pub struct EvaluationOutcome {
    /// Every (ticker, strategy) result, declined ones included
    pub results: BTreeMap<Ticker, Vec<StrategyResult>>,
    /// Category of each evaluated strategy
    pub categories: BTreeMap<String, StrategyCategory>,
    pub strategies: Vec<StrategyOutcome>,
    pub issues: Vec<Issue>,
}

impl EvaluationOutcome {
    /// Results for `ticker` with a usable fair value
    pub fn participating(&self, ticker: &Ticker) -> Vec<&StrategyResult> {
        self.results
            .get(ticker)
            .map(|list| {
                list.iter()
                    .filter(|r| r.participating_value().is_some())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Evaluates requested strategies over merged records
#[derive(Debug, Clone)]
pub struct Evaluator {
    registry: Arc<StrategyRegistry>,
    timeout: Duration,
}

struct Slot {
    results: Vec<StrategyResult>,
    issues: Vec<Issue>,
    outcome: StrategyOutcome,
}

impl Evaluator {
    pub fn new(registry: Arc<StrategyRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Evaluate `names` over `records`.
    ///
    /// Fails only for an unregistered strategy name or when the run was
    /// cancelled before any batch was sent.
    pub async fn evaluate(
        &self,
        names: &[String],
        records: &[MergedRecord],
        cancel: &CancellationToken,
    ) -> Result<EvaluationOutcome> {
        let mut seen = HashSet::new();
        let mut strategies = Vec::new();
        for name in names {
            if seen.insert(name.as_str()) {
                strategies.push(self.registry.get(name)?);
            }
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let records: Arc<[MergedRecord]> = records.into();
        let handles: Vec<_> = strategies
            .iter()
            .map(|strategy| {
                let strategy = Arc::clone(strategy);
                let records = Arc::clone(&records);
                let cancel = cancel.clone();
                let timeout = self.timeout;
                tokio::spawn(async move { run_strategy(strategy, &records, timeout, &cancel).await })
            })
            .collect();

        let slots = futures::future::join_all(handles).await;

        let mut outcome = EvaluationOutcome::default();
        for (strategy, slot) in strategies.iter().zip(slots) {
            let slot = match slot {
                Ok(slot) => slot,
                Err(e) => {
                    let error = StrategyError::Internal(e.to_string());
                    warn!(strategy = %strategy.name(), error = %error, "Strategy task failed");
                    Slot {
                        results: Vec::new(),
                        issues: vec![Issue::strategy_service(strategy.name(), &error)],
                        outcome: StrategyOutcome {
                            strategy: strategy.name().to_string(),
                            category: strategy.category(),
                            elapsed: Duration::ZERO,
                            result: Err(error),
                        },
                    }
                }
            };

            outcome
                .categories
                .insert(slot.outcome.strategy.clone(), slot.outcome.category);
            for result in slot.results {
                outcome
                    .results
                    .entry(result.ticker.clone())
                    .or_default()
                    .push(result);
            }
            outcome.issues.extend(slot.issues);
            outcome.strategies.push(slot.outcome);
        }

        info!(
            strategies = outcome.strategies.len(),
            failed = outcome.strategies.iter().filter(|s| s.result.is_err()).count(),
            "Evaluation complete"
        );
        Ok(outcome)
    }
}

async fn run_strategy(
    strategy: Arc<dyn Strategy>,
    records: &[MergedRecord],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Slot {
    let name = strategy.name().to_string();
    let required = strategy.required_fields();
    let started = Instant::now();

    let mut results = Vec::new();
    let mut issues = Vec::new();
    let mut eligible = Vec::new();
    for record in records {
        let missing = record.missing(&required);
        if missing.is_empty() {
            eligible.push(record.clone());
        } else {
            let reason = format!("missing required fields: {}", missing.join(", "));
            debug!(strategy = %name, ticker = %record.ticker, %reason, "Strategy skipped ticker");
            issues.push(Issue::strategy_input(&name, record.ticker.clone(), &reason));
            results.push(StrategyResult::declined(record.ticker.clone(), &name, reason));
        }
    }

    let batch = if eligible.is_empty() {
        Ok(Vec::new())
    } else if cancel.is_cancelled() {
        Err(StrategyError::Cancelled)
    } else {
        match tokio::time::timeout(timeout, strategy.evaluate(&eligible)).await {
            Ok(result) => result,
            Err(_) => Err(StrategyError::Timeout(timeout)),
        }
    };

    let result = match batch {
        Ok(batch) => {
            let mut by_ticker: HashMap<Ticker, StrategyResult> = HashMap::new();
            for result in batch {
                by_ticker.entry(result.ticker.clone()).or_insert(result);
            }

            let mut valued = 0;
            for record in &eligible {
                let result = match by_ticker.remove(&record.ticker) {
                    Some(mut result) if result.participating_value().is_some() => {
                        result.strategy = name.clone();
                        valued += 1;
                        result
                    }
                    Some(result) => {
                        let reason = if result.notes.is_empty() {
                            "no usable fair value".to_string()
                        } else {
                            result.notes
                        };
                        issues.push(Issue::strategy_input(&name, record.ticker.clone(), &reason));
                        StrategyResult::declined(record.ticker.clone(), &name, reason)
                    }
                    None => {
                        let reason = "no result returned";
                        issues.push(Issue::strategy_input(&name, record.ticker.clone(), reason));
                        StrategyResult::declined(record.ticker.clone(), &name, reason)
                    }
                };
                results.push(result);
            }
            Ok(valued)
        }
        Err(e) => {
            warn!(strategy = %name, error = %e, tickers = eligible.len(), "Strategy batch failed");
            issues.push(Issue::strategy_service(&name, &e));
            for record in &eligible {
                results.push(StrategyResult::declined(record.ticker.clone(), &name, e.to_string()));
            }
            Err(e)
        }
    };

    Slot {
        results,
        issues,
        outcome: StrategyOutcome {
            strategy: name,
            category: strategy.category(),
            elapsed: started.elapsed(),
            result,
        },
    }
}
