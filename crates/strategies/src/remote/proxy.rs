//! Proxy strategy backed by a [`ScoringClient`]

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

use common::protocol::{ScoreItem, ScoreRequest};
use common::{MergedRecord, StrategyCategory, StrategyResult, Ticker};

use super::client::ScoringClient;
use crate::error::Result;
use crate::strategy::Strategy;

/// Strategy whose valuation is computed by the scoring service
///
/// The whole batch goes out in one request; no partial results are
/// inferred when that request fails.
pub struct RemoteStrategy {
    name: String,
    category: StrategyCategory,
    required_fields: BTreeSet<String>,
    client: Arc<dyn ScoringClient>,
}

impl RemoteStrategy {
    pub fn new(
        name: impl Into<String>,
        category: StrategyCategory,
        required_fields: BTreeSet<String>,
        client: Arc<dyn ScoringClient>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            required_fields,
            client,
        }
    }
}

#[async_trait]
impl Strategy for RemoteStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> StrategyCategory {
        self.category
    }

    fn required_fields(&self) -> BTreeSet<String> {
        self.required_fields.clone()
    }

    async fn evaluate(&self, records: &[MergedRecord]) -> Result<Vec<StrategyResult>> {
        let request = ScoreRequest {
            strategy: self.name.clone(),
            items: records
                .iter()
                .map(|r| ScoreItem {
                    ticker: r.ticker.to_string(),
                    data: r.field_map(),
                })
                .collect(),
        };
        let batch: HashMap<&str, &Ticker> =
            records.iter().map(|r| (r.ticker.as_str(), &r.ticker)).collect();

        let response = self.client.score(&request).await?;

        let mut results = Vec::with_capacity(response.items.len());
        for item in response.items {
            let Some(ticker) = batch.get(item.ticker.trim().to_uppercase().as_str()) else {
                debug!(strategy = %self.name, ticker = %item.ticker, "Ignoring result for ticker outside the batch");
                continue;
            };
            let result = match item.result.fair_value {
                Some(fv) => StrategyResult::valued((*ticker).clone(), &self.name, fv, item.result.conf)
                    .with_notes(item.result.notes)
                    .with_inputs(item.result.inputs),
                None => {
                    let reason = if item.result.notes.is_empty() {
                        "declined by scoring service".to_string()
                    } else {
                        item.result.notes
                    };
                    StrategyResult::declined((*ticker).clone(), &self.name, reason)
                }
            };
            results.push(result);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StrategyError;
    use crate::remote::MockScoringClient;
    use assert_matches::assert_matches;
    use common::FieldValue;

    fn record(symbol: &str) -> MergedRecord {
        let mut rec = MergedRecord::new(Ticker::new(symbol).unwrap());
        rec.resolve("eps_ttm", &FieldValue::Number(2.0), "mock");
        rec
    }

    fn remote(client: Arc<MockScoringClient>) -> RemoteStrategy {
        RemoteStrategy::new(
            "dcf",
            StrategyCategory::MultipleReversion,
            ["eps_ttm".to_string()].into(),
            client,
        )
    }

    #[tokio::test]
    async fn test_batches_all_records_in_one_request() {
        let client = Arc::new(MockScoringClient::new().with_fair_value("AAPL", 150.0));
        let strategy = remote(client.clone());

        let results = strategy.evaluate(&[record("AAPL"), record("MSFT")]).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].fair_value, Some(150.0));
        assert_eq!(results[0].strategy, "dcf");

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].strategy, "dcf");
        assert_eq!(requests[0].items.len(), 2);
        assert_eq!(requests[0].items[0].data["eps_ttm"], FieldValue::Number(2.0));
    }

    #[tokio::test]
    async fn test_client_failure_fails_batch() {
        let client = Arc::new(MockScoringClient::new().with_failure(
            "dcf",
            StrategyError::Status {
                status: 500,
                body: "boom".into(),
            },
        ));
        let result = remote(client).evaluate(&[record("AAPL")]).await;
        assert_matches!(result, Err(StrategyError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_omitted_tickers_are_not_invented() {
        let client = Arc::new(
            MockScoringClient::new()
                .with_default_fair_value(None)
                .with_fair_value("MSFT", 300.0),
        );
        let results = remote(client).evaluate(&[record("AAPL"), record("MSFT")]).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ticker.as_str(), "MSFT");
    }
}
