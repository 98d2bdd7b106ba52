//! Fixed per-ticker values supplied through configuration

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

use common::{FieldValue, RawRecord, Ticker};

use crate::adapter::Adapter;
use crate::error::Result;

/// Adapter that answers from an in-memory table
///
/// Handy for overriding a handful of values (e.g. a manual growth
/// estimate) by placing it ahead of vendor adapters in the priority list.
#[derive(Debug, Clone)]
pub struct StaticAdapter {
    name: String,
    records: BTreeMap<Ticker, BTreeMap<String, Option<FieldValue>>>,
}

impl StaticAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: BTreeMap::new(),
        }
    }

    /// Add (or extend) the row for `ticker`
    pub fn with_record(
        mut self,
        ticker: Ticker,
        fields: impl IntoIterator<Item = (String, Option<FieldValue>)>,
    ) -> Self {
        self.records.entry(ticker).or_default().extend(fields);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl Adapter for StaticAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> BTreeSet<String> {
        self.records
            .values()
            .flat_map(|row| row.keys().cloned())
            .collect()
    }

    async fn fetch(&self, tickers: &[Ticker]) -> Result<Vec<RawRecord>> {
        Ok(tickers
            .iter()
            .filter_map(|t| {
                self.records.get(t).map(|row| RawRecord {
                    ticker: t.clone(),
                    fields: row.clone(),
                })
            })
            .collect())
    }
}
