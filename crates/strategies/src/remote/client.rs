//! Scoring service client - trait and implementations

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use common::protocol::{
    ScoreRequest, ScoreResponse, ScoreResult, ScoredItem, EVAL_PATH, PROTOCOL_HEADER,
    PROTOCOL_VERSION,
};

use crate::error::{Result, StrategyError};

/// Client trait for the scoring service - transport agnostic
#[async_trait]
pub trait ScoringClient: Send + Sync {
    /// Score one batch for one strategy.
    ///
    /// Any error fails the batch as a whole.
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResponse>;
}

// ==================== Mock Implementation ====================

/// Mock scoring client for testing
///
/// Values every item at a configured fair value (or `default_fair_value`)
/// unless a failure is configured for the requested strategy.
pub struct MockScoringClient {
    fair_values: HashMap<String, f64>,
    default_fair_value: Option<f64>,
    failures: HashMap<String, StrategyError>,
    requests: Mutex<Vec<ScoreRequest>>,
}

impl MockScoringClient {
    pub fn new() -> Self {
        Self {
            fair_values: HashMap::new(),
            default_fair_value: Some(100.0),
            failures: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fair value returned for `ticker`
    pub fn with_fair_value(mut self, ticker: impl Into<String>, value: f64) -> Self {
        self.fair_values.insert(ticker.into(), value);
        self
    }

    /// Value for tickers without an explicit fair value; `None` omits them
    pub fn with_default_fair_value(mut self, value: Option<f64>) -> Self {
        self.default_fair_value = value;
        self
    }

    /// Fail every batch for `strategy`
    pub fn with_failure(mut self, strategy: impl Into<String>, error: StrategyError) -> Self {
        self.failures.insert(strategy.into(), error);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ScoreRequest> {
        self.requests.lock().clone()
    }
}

impl Default for MockScoringClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScoringClient for MockScoringClient {
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResponse> {
        self.requests.lock().push(request.clone());

        if let Some(error) = self.failures.get(&request.strategy) {
            return Err(error.clone());
        }

        let items = request
            .items
            .iter()
            .filter_map(|item| {
                let fair_value = self
                    .fair_values
                    .get(&item.ticker)
                    .copied()
                    .or(self.default_fair_value)?;
                Some(ScoredItem {
                    ticker: item.ticker.clone(),
                    result: ScoreResult {
                        fair_value: Some(fair_value),
                        inputs: item.data.clone(),
                        notes: String::new(),
                        conf: 0.5,
                    },
                })
            })
            .collect();

        Ok(ScoreResponse { items })
    }
}

// ==================== HTTP Implementation ====================

/// HTTP scoring client: `POST {base_url}/eval`
pub struct HttpScoringClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpScoringClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StrategyError::Internal(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, EVAL_PATH)
    }

    fn transport_error(&self, e: reqwest::Error) -> StrategyError {
        if e.is_timeout() {
            StrategyError::Timeout(self.timeout)
        } else {
            StrategyError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ScoringClient for HttpScoringClient {
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResponse> {
        let response = self
            .client
            .post(self.endpoint())
            .header(PROTOCOL_HEADER, PROTOCOL_VERSION.to_string())
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StrategyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&body).map_err(|e| StrategyError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use common::protocol::ScoreItem;
    use common::FieldMap;

    async fn spawn_service(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request(strategy: &str, tickers: &[&str]) -> ScoreRequest {
        ScoreRequest {
            strategy: strategy.to_string(),
            items: tickers
                .iter()
                .map(|t| ScoreItem {
                    ticker: t.to_string(),
                    data: FieldMap::new(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_mock_values_and_records_requests() {
        let client = MockScoringClient::new().with_fair_value("AAPL", 180.0);
        let resp = client.score(&request("s", &["AAPL", "MSFT"])).await.unwrap();
        assert_eq!(resp.items[0].result.fair_value, Some(180.0));
        assert_eq!(resp.items[1].result.fair_value, Some(100.0));
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_failure_is_per_strategy() {
        let client = MockScoringClient::new()
            .with_failure("peter_lynch", StrategyError::Transport("refused".into()));
        assert!(client.score(&request("peter_lynch", &["A"])).await.is_err());
        assert!(client.score(&request("psales_rev", &["A"])).await.is_ok());
    }

    #[tokio::test]
    async fn test_http_round_trip_sends_protocol_header() {
        let router = Router::new().route(
            "/eval",
            post(|headers: HeaderMap, Json(req): Json<ScoreRequest>| async move {
                let version_ok = headers
                    .get(PROTOCOL_HEADER)
                    .and_then(|v| v.to_str().ok())
                    == Some("1");
                let items = req
                    .items
                    .into_iter()
                    .map(|item| ScoredItem {
                        ticker: item.ticker,
                        result: ScoreResult {
                            fair_value: version_ok.then_some(42.0),
                            inputs: FieldMap::new(),
                            notes: req.strategy.clone(),
                            conf: 0.9,
                        },
                    })
                    .collect();
                Json(ScoreResponse { items })
            }),
        );
        let base = spawn_service(router).await;

        let client = HttpScoringClient::new(&format!("{}/", base), Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint(), format!("{}/eval", base));

        let resp = client.score(&request("graham", &["ACME"])).await.unwrap();
        assert_eq!(resp.items.len(), 1);
        assert_eq!(resp.items[0].result.fair_value, Some(42.0));
        assert_eq!(resp.items[0].result.notes, "graham");
    }

    #[tokio::test]
    async fn test_http_error_status_fails_batch() {
        let router = Router::new().route(
            "/eval",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "{\"error\":\"boom\"}") }),
        );
        let base = spawn_service(router).await;
        let client = HttpScoringClient::new(&base, Duration::from_secs(5)).unwrap();

        let result = client.score(&request("peter_lynch", &["ACME"])).await;
        assert_matches!(result, Err(StrategyError::Status { status: 500, body }) if body.contains("boom"));
    }

    #[tokio::test]
    async fn test_http_malformed_body_is_decode_error() {
        let router = Router::new().route("/eval", post(|| async { "not json" }));
        let base = spawn_service(router).await;
        let client = HttpScoringClient::new(&base, Duration::from_secs(5)).unwrap();

        assert_matches!(
            client.score(&request("s", &["A"])).await,
            Err(StrategyError::Decode(_))
        );
    }

    #[tokio::test]
    async fn test_http_unreachable_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            HttpScoringClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        assert_matches!(
            client.score(&request("s", &["A"])).await,
            Err(StrategyError::Transport(_) | StrategyError::Timeout(_))
        );
    }
}
