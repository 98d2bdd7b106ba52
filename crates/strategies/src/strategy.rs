//! Strategy traits

use async_trait::async_trait;
use std::collections::BTreeSet;

use common::{FieldMap, MergedRecord, StrategyCategory, StrategyResult};

use crate::error::Result;

/// A pluggable valuation model
///
/// `evaluate` receives only records that define every required field. It
/// is all-or-nothing: an `Err` fails the strategy for the whole batch.
/// Tickers missing from the returned results are treated as declined.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    fn category(&self) -> StrategyCategory;

    fn required_fields(&self) -> BTreeSet<String>;

    async fn evaluate(&self, records: &[MergedRecord]) -> Result<Vec<StrategyResult>>;
}

/// Outcome of computing one ticker in-process
#[derive(Debug, Clone, PartialEq)]
pub enum Computation {
    Valued {
        fair_value: f64,
        confidence: f64,
        notes: String,
        inputs: FieldMap,
    },
    Declined(String),
}

impl Computation {
    pub fn valued(fair_value: f64, confidence: f64) -> Self {
        Computation::Valued {
            fair_value,
            confidence,
            notes: String::new(),
            inputs: FieldMap::new(),
        }
    }

    pub fn declined(reason: impl Into<String>) -> Self {
        Computation::Declined(reason.into())
    }

    pub fn with_notes(self, text: impl Into<String>) -> Self {
        match self {
            Computation::Valued {
                fair_value,
                confidence,
                inputs,
                ..
            } => Computation::Valued {
                fair_value,
                confidence,
                notes: text.into(),
                inputs,
            },
            declined => declined,
        }
    }

    pub fn with_input(mut self, name: &str, value: f64) -> Self {
        if let Computation::Valued { inputs, .. } = &mut self {
            inputs.insert(name.to_string(), value.into());
        }
        self
    }
}

/// A strategy computed synchronously per ticker
///
/// Every `LocalStrategy` is a [`Strategy`]; a batch never fails as a whole.
pub trait LocalStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn category(&self) -> StrategyCategory;

    fn required_fields(&self) -> BTreeSet<String>;

    fn compute(&self, record: &MergedRecord) -> Computation;
}

#[async_trait]
impl<T: LocalStrategy> Strategy for T {
    fn name(&self) -> &str {
        LocalStrategy::name(self)
    }

    fn category(&self) -> StrategyCategory {
        LocalStrategy::category(self)
    }

    fn required_fields(&self) -> BTreeSet<String> {
        LocalStrategy::required_fields(self)
    }

    async fn evaluate(&self, records: &[MergedRecord]) -> Result<Vec<StrategyResult>> {
        let name = LocalStrategy::name(self);
        Ok(records
            .iter()
            .map(|record| match self.compute(record) {
                Computation::Valued {
                    fair_value,
                    confidence,
                    notes,
                    inputs,
                } => StrategyResult::valued(record.ticker.clone(), name, fair_value, confidence)
                    .with_notes(notes)
                    .with_inputs(inputs),
                Computation::Declined(reason) => {
                    StrategyResult::declined(record.ticker.clone(), name, reason)
                }
            })
            .collect())
    }
}
