//! Versioned snapshot handed to every sink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use common::{AggregationMode, ConsensusRecord, Issue};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub aggregation: AggregationMode,
    pub min_mos: f64,
    /// Sorted by ticker
    pub records: Vec<ConsensusRecord>,
    pub issues: Vec<Issue>,
}

impl Snapshot {
    pub fn new(
        run_id: impl Into<String>,
        aggregation: AggregationMode,
        min_mos: f64,
        mut records: Vec<ConsensusRecord>,
        issues: Vec<Issue>,
    ) -> Self {
        records.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Self {
            schema_version: SCHEMA_VERSION,
            run_id: run_id.into(),
            generated_at: Utc::now(),
            aggregation,
            min_mos,
            records,
            issues,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy keeping only records that pass both filters.
    ///
    /// `min_mos` drops records without a margin of safety.
    pub fn filtered(&self, undervalued_only: bool, min_mos: Option<f64>) -> Snapshot {
        let records = self
            .records
            .iter()
            .filter(|r| !undervalued_only || r.undervalued)
            .filter(|r| match min_mos {
                Some(threshold) => r.margin_of_safety.is_some_and(|mos| mos >= threshold),
                None => true,
            })
            .cloned()
            .collect();
        Snapshot {
            records,
            ..self.clone()
        }
    }

    /// Up to `n` undervalued records, largest margin of safety first
    pub fn top_undervalued(&self, n: usize) -> Vec<&ConsensusRecord> {
        let mut undervalued: Vec<&ConsensusRecord> =
            self.records.iter().filter(|r| r.undervalued).collect();
        undervalued.sort_by(|a, b| {
            b.margin_of_safety
                .partial_cmp(&a.margin_of_safety)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.ticker.cmp(&b.ticker))
        });
        undervalued.truncate(n);
        undervalued
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use common::{Ticker, WeightSet};
    use std::collections::BTreeMap;

    pub fn record(symbol: &str, price: Option<f64>, fair_value: f64) -> ConsensusRecord {
        let mos = price.map(|p| (fair_value - p) / fair_value);
        ConsensusRecord {
            ticker: Ticker::new(symbol).unwrap(),
            price,
            fair_value,
            margin_of_safety: mos,
            contributing_strategies: vec!["peter_lynch".to_string()],
            weights: WeightSet::normalized([("peter_lynch".to_string(), 1.0)].into()),
            strategy_fair_values: BTreeMap::from([("peter_lynch".to_string(), fair_value)]),
            strategy_confidences: BTreeMap::from([("peter_lynch".to_string(), 0.6)]),
            p25: fair_value,
            p75: fair_value,
            undervalued: mos.is_some_and(|m| m >= 0.2),
        }
    }

    pub fn snapshot(records: Vec<ConsensusRecord>) -> Snapshot {
        Snapshot::new("run-1", AggregationMode::WeightedAverage, 0.2, records, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{record, snapshot};
    use super::*;

    #[test]
    fn test_new_sorts_and_versions() {
        let snap = snapshot(vec![record("MSFT", Some(10.0), 20.0), record("AAPL", Some(10.0), 11.0)]);
        assert_eq!(snap.schema_version, 1);
        assert_eq!(snap.records[0].ticker.as_str(), "AAPL");
    }

    #[test]
    fn test_serialized_shape() {
        let snap = snapshot(vec![record("AAPL", Some(50.0), 100.0)]);
        let value = serde_json::to_value(&snap).unwrap();

        for key in ["schema_version", "run_id", "generated_at", "aggregation", "min_mos", "records", "issues"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["aggregation"], "weighted_average");
        assert_eq!(value["records"][0]["ticker"], "AAPL");

        let back: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_filters() {
        let snap = snapshot(vec![
            record("AAA", Some(50.0), 100.0),
            record("BBB", Some(90.0), 100.0),
            record("CCC", None, 100.0),
        ]);

        let under = snap.filtered(true, None);
        assert_eq!(under.records.len(), 1);
        assert_eq!(under.records[0].ticker.as_str(), "AAA");

        let loose = snap.filtered(false, Some(0.05));
        let names: Vec<_> = loose.records.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(names, vec!["AAA", "BBB"]);

        assert_eq!(snap.filtered(false, None).records.len(), 3);
    }

    #[test]
    fn test_top_undervalued_orders_by_mos() {
        let snap = snapshot(vec![
            record("AAA", Some(70.0), 100.0),
            record("BBB", Some(10.0), 100.0),
            record("CCC", Some(99.0), 100.0),
        ]);
        let top: Vec<_> = snap.top_undervalued(5).iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(top, vec!["BBB", "AAA"]);
    }
}
