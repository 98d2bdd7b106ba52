//! Deterministic in-process data source
//!
//! Fundamentals are derived from the ticker symbol alone so repeated runs
//! produce identical numbers. Useful for demos, local runs and tests.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::time::Duration;

use common::fields;
use common::{RawRecord, Ticker};

use crate::adapter::Adapter;
use crate::error::{AdapterError, Result};

const SECTORS: [&str; 6] = [
    "Technology",
    "Healthcare",
    "Financials",
    "Industrials",
    "Consumer",
    "Energy",
];

/// Mock adapter with optional latency and failure injection
#[derive(Debug, Clone)]
pub struct MockAdapter {
    name: String,
    latency: Duration,
    failure: Option<String>,
    omit: BTreeSet<String>,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            latency: Duration::ZERO,
            failure: None,
            omit: BTreeSet::new(),
        }
    }

    /// Register under a different name (several mocks can coexist)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sleep this long before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail every fetch with the given reason
    pub fn with_failure(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Never return records for this ticker
    pub fn without_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.omit.insert(ticker.into().to_uppercase());
        self
    }

    fn record_for(&self, ticker: &Ticker) -> RawRecord {
        let symbol = ticker.as_str();
        let base = (symbol.len() * 7 + 15) as f64;
        let seed: u32 = symbol.bytes().map(u32::from).sum();

        let price = round(base * 1.7, 2);
        let eps = round(base / 10.0 + 0.8, 3);
        let growth = round(0.04 + f64::from(seed % 17) / 100.0, 3);
        let net_margin = round(0.02 + f64::from(seed % 15) / 100.0, 3);
        let shares = 100_000_000.0;
        let revenue = round(base * shares * (1.0 + f64::from(seed % 5) / 10.0), 0);
        let bvps = round(base * 0.6, 2);
        let sector = SECTORS[(seed as usize) % SECTORS.len()];

        RawRecord::new(ticker.clone())
            .with_field(fields::PRICE, price)
            .with_field(fields::EPS_TTM, eps)
            .with_field(fields::GROWTH_5Y_EST, growth)
            .with_field(fields::NET_MARGIN, net_margin)
            .with_field(fields::REVENUE_TTM, revenue)
            .with_field(fields::SHARES_OUTSTANDING, shares)
            .with_field(fields::BOOK_VALUE_PER_SHARE, bvps)
            .with_field(fields::SECTOR, sector)
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> BTreeSet<String> {
        [
            fields::PRICE,
            fields::EPS_TTM,
            fields::GROWTH_5Y_EST,
            fields::NET_MARGIN,
            fields::REVENUE_TTM,
            fields::SHARES_OUTSTANDING,
            fields::BOOK_VALUE_PER_SHARE,
            fields::SECTOR,
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    async fn fetch(&self, tickers: &[Ticker]) -> Result<Vec<RawRecord>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(reason) = &self.failure {
            return Err(AdapterError::Unavailable(reason.clone()));
        }

        Ok(tickers
            .iter()
            .filter(|t| !self.omit.contains(t.as_str()))
            .map(|t| self.record_for(t))
            .collect())
    }
}

fn round(v: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (v * f).round() / f
}
