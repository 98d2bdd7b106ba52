//! Consensus aggregation

use std::collections::BTreeMap;
use tracing::{debug, warn};

use common::fields;
use common::{
    AggregationMode, ConsensusRecord, Issue, MergedRecord, StrategyCategory, StrategyResult,
    Ticker, WeightSet,
};

use crate::stats::{median, percentile};
use crate::weighting::WeightingEngine;

/// Combines participating strategy values into one fair value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregator {
    mode: AggregationMode,
    min_mos: f64,
}

impl Aggregator {
    pub fn new(mode: AggregationMode, min_mos: f64) -> Self {
        Self { mode, min_mos }
    }

    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    pub fn min_mos(&self) -> f64 {
        self.min_mos
    }

    /// Build the consensus for one ticker.
    ///
    /// Returns `None` when no result carries a usable fair value.
    pub fn aggregate(
        &self,
        ticker: &Ticker,
        price: Option<f64>,
        results: &[StrategyResult],
        weights: &WeightSet,
    ) -> Option<ConsensusRecord> {
        let participating: Vec<(&StrategyResult, f64)> = results
            .iter()
            .filter_map(|r| r.participating_value().map(|fv| (r, fv)))
            .collect();
        if participating.is_empty() {
            return None;
        }

        let values: Vec<f64> = participating.iter().map(|(_, fv)| *fv).collect();
        let fair_value = match self.mode {
            AggregationMode::WeightedAverage => participating
                .iter()
                .map(|(r, fv)| weights.get(&r.strategy) * fv)
                .sum(),
            AggregationMode::Median => median(&values),
        };

        let margin_of_safety = price.map(|p| margin_of_safety(fair_value, p));
        let undervalued = margin_of_safety.is_some_and(|mos| mos >= self.min_mos);

        Some(ConsensusRecord {
            ticker: ticker.clone(),
            price,
            fair_value,
            margin_of_safety,
            contributing_strategies: participating.iter().map(|(r, _)| r.strategy.clone()).collect(),
            weights: weights.clone(),
            strategy_fair_values: participating
                .iter()
                .map(|(r, fv)| (r.strategy.clone(), *fv))
                .collect(),
            strategy_confidences: participating
                .iter()
                .map(|(r, _)| (r.strategy.clone(), r.confidence))
                .collect(),
            p25: percentile(&values, 0.25),
            p75: percentile(&values, 0.75),
            undervalued,
        })
    }
}

/// `(fair_value - price) / fair_value`, or 0 when fair value is not positive
pub fn margin_of_safety(fair_value: f64, price: f64) -> f64 {
    if fair_value > 0.0 {
        (fair_value - price) / fair_value
    } else {
        0.0
    }
}

#[derive(Debug, Default)]
pub struct ConsensusOutcome {
    /// Sorted by ticker
    pub records: Vec<ConsensusRecord>,
    pub issues: Vec<Issue>,
}

/// Weighting followed by aggregation for every merged ticker
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    weighting: WeightingEngine,
    aggregator: Aggregator,
}

impl ConsensusEngine {
    pub fn new(weighting: WeightingEngine, aggregator: Aggregator) -> Self {
        Self {
            weighting,
            aggregator,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn run(
        &self,
        records: &[MergedRecord],
        results: &BTreeMap<Ticker, Vec<StrategyResult>>,
        categories: &BTreeMap<String, StrategyCategory>,
    ) -> ConsensusOutcome {
        let mut outcome = ConsensusOutcome::default();
        for record in records {
            let ticker_results = results.get(&record.ticker).map(Vec::as_slice).unwrap_or(&[]);
            let weights = self.weighting.weights(record, ticker_results, categories);
            let price = record.number(fields::PRICE);

            match self.aggregator.aggregate(&record.ticker, price, ticker_results, &weights) {
                Some(consensus) => {
                    debug!(
                        ticker = %consensus.ticker,
                        fair_value = consensus.fair_value,
                        mos = ?consensus.margin_of_safety,
                        "Consensus computed"
                    );
                    outcome.records.push(consensus);
                }
                None => {
                    warn!(ticker = %record.ticker, "No participating strategy");
                    outcome.issues.push(Issue::NoParticipatingStrategy {
                        ticker: record.ticker.clone(),
                    });
                }
            }
        }
        outcome.records.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        outcome
    }
}
