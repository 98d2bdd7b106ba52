//! Wire shapes for the remote scoring service
//!
//! One request carries every (ticker, data) pair for a single strategy;
//! the response lists a result per ticker the service chose to value.
//!
//! ```json
//! {"strategy": "peter_lynch", "items": [{"ticker": "ACME", "data": {"eps_ttm": 2.5}}]}
//! {"items": [{"ticker": "ACME", "result": {"fair_value": 31.2, "inputs": {}, "notes": "", "conf": 0.7}}]}
//! ```

use serde::{Deserialize, Serialize};

use crate::types::FieldMap;

/// Version sent with every request; bumped on incompatible shape changes
pub const PROTOCOL_VERSION: u32 = 1;

/// Header carrying [`PROTOCOL_VERSION`]
pub const PROTOCOL_HEADER: &str = "X-Scoring-Protocol";

/// Path of the batch evaluation endpoint, relative to the service base URL
pub const EVAL_PATH: &str = "/eval";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub strategy: String,
    pub items: Vec<ScoreItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreItem {
    pub ticker: String,
    pub data: FieldMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    #[serde(default)]
    pub items: Vec<ScoredItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub ticker: String,
    pub result: ScoreResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Null means the service declined this ticker
    pub fair_value: Option<f64>,
    #[serde(default)]
    pub inputs: FieldMap,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub conf: f64,
}

/// Body returned with a non-success status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}
