//! Fetch orchestration
//!
//! Each requested adapter runs in its own task with a per-call timeout and
//! writes into its own result slot. Slots are collected only after every
//! task has finished, so no locking is needed. A failing adapter becomes an
//! [`Issue::AdapterFetch`] and never aborts the fetch.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use common::{Error, Issue, RawRecord, Result, Ticker};

use crate::error::AdapterError;
use crate::registry::AdapterRegistry;

/// A raw record tagged with the adapter that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedRecord {
    pub adapter: String,
    pub record: RawRecord,
}

/// How one adapter call went
#[derive(Debug, Clone)]
pub struct AdapterOutcome {
    pub adapter: String,
    pub elapsed: Duration,
    /// Number of records kept, or the failure
    pub result: std::result::Result<usize, AdapterError>,
}

impl AdapterOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything the merge stage needs, plus per-adapter bookkeeping
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Records per requested ticker, in adapter priority order
    pub per_ticker: BTreeMap<Ticker, Vec<SourcedRecord>>,
    /// One entry per adapter, in priority order
    pub adapters: Vec<AdapterOutcome>,
    pub issues: Vec<Issue>,
}

/// Drives the requested adapters for a ticker set
#[derive(Debug, Clone)]
pub struct FetchOrchestrator {
    registry: Arc<AdapterRegistry>,
    timeout: Duration,
}

impl FetchOrchestrator {
    pub fn new(registry: Arc<AdapterRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Fetch `tickers` from `priority` (highest priority first).
    ///
    /// Fails only when a requested adapter name is not registered, or when
    /// the run was cancelled before any call was issued.
    pub async fn fetch(
        &self,
        priority: &[String],
        tickers: &[Ticker],
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome> {
        let mut seen = HashSet::new();
        let mut adapters = Vec::new();
        for name in priority {
            if !seen.insert(name.as_str()) {
                debug!(adapter = %name, "Duplicate adapter in priority list ignored");
                continue;
            }
            adapters.push(self.registry.get(name)?);
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let tickers: Arc<[Ticker]> = tickers.into();
        let handles: Vec<_> = adapters
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                let tickers = Arc::clone(&tickers);
                let cancel = cancel.clone();
                let timeout = self.timeout;
                tokio::spawn(async move {
                    let started = Instant::now();
                    if cancel.is_cancelled() {
                        return (Err(AdapterError::Cancelled), started.elapsed());
                    }
                    let result = match tokio::time::timeout(timeout, adapter.fetch(&tickers)).await {
                        Ok(result) => result,
                        Err(_) => Err(AdapterError::Timeout(timeout)),
                    };
                    (result, started.elapsed())
                })
            })
            .collect();

        let slots = futures::future::join_all(handles).await;

        let requested: HashSet<&Ticker> = tickers.iter().collect();
        let mut outcome = FetchOutcome::default();
        for (adapter, slot) in adapters.iter().zip(slots) {
            let name = adapter.name().to_string();
            let (result, elapsed) = match slot {
                Ok(pair) => pair,
                Err(e) => (Err(AdapterError::Internal(e.to_string())), Duration::ZERO),
            };

            let result = match result {
                Ok(records) => {
                    let mut kept = 0;
                    for record in records {
                        if !requested.contains(&record.ticker) {
                            debug!(adapter = %name, ticker = %record.ticker, "Dropping unrequested ticker");
                            continue;
                        }
                        kept += 1;
                        outcome
                            .per_ticker
                            .entry(record.ticker.clone())
                            .or_default()
                            .push(SourcedRecord {
                                adapter: name.clone(),
                                record,
                            });
                    }
                    debug!(adapter = %name, records = kept, elapsed_ms = elapsed.as_millis() as u64, "Adapter fetch complete");
                    Ok(kept)
                }
                Err(e) => {
                    warn!(adapter = %name, error = %e, "Adapter fetch failed");
                    outcome.issues.push(Issue::adapter_fetch(&name, &e));
                    Err(e)
                }
            };

            outcome.adapters.push(AdapterOutcome {
                adapter: name,
                elapsed,
                result,
            });
        }

        info!(
            adapters = outcome.adapters.len(),
            failed = outcome.issues.len(),
            tickers_with_data = outcome.per_ticker.len(),
            "Fetch complete"
        );
        Ok(outcome)
    }
}
