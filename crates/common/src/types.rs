//! Domain types shared across the valuation pipeline
//!
//! Data flows strictly forward: adapters produce [`RawRecord`]s, the merge
//! stage folds them into one [`MergedRecord`] per ticker, strategies turn a
//! merged record into [`StrategyResult`]s, the weighting engine produces a
//! [`WeightSet`], and the aggregator emits one [`ConsensusRecord`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// ============================================================================
// Ticker
// ============================================================================

/// Uppercase security symbol, unique within one run
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Normalize and validate a symbol (trimmed, uppercased, non-empty)
    pub fn new(symbol: impl AsRef<str>) -> Result<Self> {
        let normalized = symbol.as_ref().trim().to_uppercase();
        if normalized.is_empty() {
            return Err(Error::invalid_input("ticker symbol must not be blank"));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(Error::invalid_input(format!(
                "ticker symbol '{}' contains whitespace",
                normalized
            )));
        }
        Ok(Self(normalized))
    }

    /// Parse a list of symbols, dropping duplicates but keeping first-seen order
    pub fn parse_list<I, S>(symbols: I) -> Result<Vec<Ticker>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for symbol in symbols {
            let ticker = Ticker::new(symbol)?;
            if seen.insert(ticker.clone()) {
                out.push(ticker);
            }
        }
        Ok(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ticker::new(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Ticker::new(value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

// ============================================================================
// Field values
// ============================================================================

/// A single fundamental value supplied by an adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value, `None` for text or non-finite numbers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    /// NaN and infinities count as "no value" for merge purposes
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Number(v) => v.is_finite(),
            FieldValue::Text(s) => !s.trim().is_empty(),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(v) => write!(f, "{}", v),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// Plain field name to value mapping (no provenance)
pub type FieldMap = BTreeMap<String, FieldValue>;

// ============================================================================
// Raw and merged records
// ============================================================================

/// Fields for one ticker produced by exactly one adapter invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub ticker: Ticker,
    /// `None` means the adapter explicitly reported the field as null
    pub fields: BTreeMap<String, Option<FieldValue>>,
}

impl RawRecord {
    pub fn new(ticker: Ticker) -> Self {
        Self {
            ticker,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), Some(value.into()));
        self
    }

    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), None);
        self
    }

    /// The value for `name` if the record defines a usable (non-null) one
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .get(name)
            .and_then(|v| v.as_ref())
            .filter(|v| v.is_present())
    }
}

/// A merged value together with the adapter that supplied it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub value: FieldValue,
    pub source: String,
}

/// Per-ticker fields after the first-non-null-wins merge
///
/// Every field present holds a usable value; absence means no adapter
/// supplied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub ticker: Ticker,
    fields: BTreeMap<String, ResolvedField>,
}

impl MergedRecord {
    pub fn new(ticker: Ticker) -> Self {
        Self {
            ticker,
            fields: BTreeMap::new(),
        }
    }

    /// Record `value` for `name` unless the field is already resolved.
    ///
    /// Returns true when the value was taken. Unusable values are ignored.
    pub fn resolve(&mut self, name: &str, value: &FieldValue, source: &str) -> bool {
        if self.fields.contains_key(name) || !value.is_present() {
            return false;
        }
        self.fields.insert(
            name.to_string(),
            ResolvedField {
                value: value.clone(),
                source: source.to_string(),
            },
        );
        true
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).map(|f| &f.value)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_f64)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Adapter that supplied `name`
    pub fn source_of(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|f| f.source.as_str())
    }

    /// Names from `required` that this record does not define
    pub fn missing<'a, I>(&self, required: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        required
            .into_iter()
            .filter(|name| !self.contains(name))
            .cloned()
            .collect()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &ResolvedField)> {
        self.fields.iter()
    }

    /// Values without provenance, as sent to strategies
    pub fn field_map(&self) -> FieldMap {
        self.fields
            .iter()
            .map(|(k, f)| (k.clone(), f.value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// Strategy outputs
// ============================================================================

/// Strategy class used by the weighting engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyCategory {
    /// Valuation driven by earnings growth (e.g. growth-adjusted P/E)
    GrowthSensitive,
    /// Valuation that reverts to a target multiple (P/S, P/B, ...)
    MultipleReversion,
}

impl StrategyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyCategory::GrowthSensitive => "growth_sensitive",
            StrategyCategory::MultipleReversion => "multiple_reversion",
        }
    }
}

impl fmt::Display for StrategyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (ticker, strategy) valuation outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub ticker: Ticker,
    pub strategy: String,
    /// `None` when the strategy declined or failed
    pub fair_value: Option<f64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub inputs: FieldMap,
}

impl StrategyResult {
    pub fn valued(
        ticker: Ticker,
        strategy: impl Into<String>,
        fair_value: f64,
        confidence: f64,
    ) -> Self {
        Self {
            ticker,
            strategy: strategy.into(),
            fair_value: Some(fair_value),
            notes: String::new(),
            confidence,
            inputs: FieldMap::new(),
        }
    }

    pub fn declined(ticker: Ticker, strategy: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            ticker,
            strategy: strategy.into(),
            fair_value: None,
            notes: notes.into(),
            confidence: 0.0,
            inputs: FieldMap::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_inputs(mut self, inputs: FieldMap) -> Self {
        self.inputs = inputs;
        self
    }

    /// A strategy participates in consensus only with a finite fair value
    pub fn participating_value(&self) -> Option<f64> {
        self.fair_value.filter(|v| v.is_finite())
    }
}

/// Per-ticker strategy weights, normalized to sum to 1 over participants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightSet {
    weights: BTreeMap<String, f64>,
}

impl WeightSet {
    /// Build from raw non-negative weights, normalizing the positive total to 1.
    ///
    /// Negative or non-finite inputs are treated as zero. When every weight
    /// is zero the set is split evenly.
    pub fn normalized(raw: BTreeMap<String, f64>) -> Self {
        let cleaned: BTreeMap<String, f64> = raw
            .into_iter()
            .map(|(k, w)| (k, if w.is_finite() && w > 0.0 { w } else { 0.0 }))
            .collect();
        let total: f64 = cleaned.values().sum();
        let weights = if total > 0.0 {
            cleaned.into_iter().map(|(k, w)| (k, w / total)).collect()
        } else if cleaned.is_empty() {
            cleaned
        } else {
            let even = 1.0 / cleaned.len() as f64;
            cleaned.into_keys().map(|k| (k, even)).collect()
        };
        Self { weights }
    }

    /// Weight for `strategy`; strategies without a result weigh 0
    pub fn get(&self, strategy: &str) -> f64 {
        self.weights.get(strategy).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.weights.iter()
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }
}

// ============================================================================
// Consensus
// ============================================================================

/// Run-wide consensus combination mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Sum of weight x fair value over participating strategies
    #[default]
    WeightedAverage,
    /// Median of participating fair values (weights reported, not applied)
    Median,
}

impl AggregationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationMode::WeightedAverage => "weighted_average",
            AggregationMode::Median => "median",
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final per-ticker output, immutable once published
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusRecord {
    pub ticker: Ticker,
    pub price: Option<f64>,
    pub fair_value: f64,
    /// `(fair_value - price) / fair_value`; 0 when fair value is not positive,
    /// `None` without a price
    pub margin_of_safety: Option<f64>,
    pub contributing_strategies: Vec<String>,
    pub weights: WeightSet,
    pub strategy_fair_values: BTreeMap<String, f64>,
    pub strategy_confidences: BTreeMap<String, f64>,
    /// 25th percentile of participating fair values
    pub p25: f64,
    /// 75th percentile of participating fair values
    pub p75: f64,
    pub undervalued: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_ticker_normalization() {
        let t = Ticker::new("  aapl ").unwrap();
        assert_eq!(t.as_str(), "AAPL");
        assert_matches!(Ticker::new("   "), Err(Error::InvalidInput(_)));
        assert_matches!(Ticker::new("BRK B"), Err(Error::InvalidInput(_)));
    }

    #[test]
    fn test_ticker_list_dedupes_in_order() {
        let list = Ticker::parse_list(["msft", "AAPL", "MSFT", "nvda"]).unwrap();
        let names: Vec<_> = list.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["MSFT", "AAPL", "NVDA"]);
    }

    #[test]
    fn test_ticker_serde_normalizes() {
        let t: Ticker = serde_json::from_str("\"tsla\"").unwrap();
        assert_eq!(t.as_str(), "TSLA");
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"TSLA\"");
    }

    #[test]
    fn test_field_value_presence() {
        assert!(FieldValue::Number(1.5).is_present());
        assert!(!FieldValue::Number(f64::NAN).is_present());
        assert!(!FieldValue::Text("  ".into()).is_present());
        assert_eq!(FieldValue::Text("Tech".into()).as_f64(), None);

        let parsed: FieldValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(parsed, FieldValue::Number(2.5));
        let parsed: FieldValue = serde_json::from_str("\"Energy\"").unwrap();
        assert_eq!(parsed, FieldValue::Text("Energy".into()));
    }

    #[test]
    fn test_raw_record_null_is_not_a_value() {
        let t = Ticker::new("X").unwrap();
        let rec = RawRecord::new(t).with_field("price", 10.0).with_null("eps_ttm");
        assert!(rec.value("price").is_some());
        assert!(rec.value("eps_ttm").is_none());
        assert!(rec.value("missing").is_none());
    }

    #[test]
    fn test_merged_record_keeps_first_resolution() {
        let mut merged = MergedRecord::new(Ticker::new("X").unwrap());
        assert!(merged.resolve("price", &FieldValue::Number(100.0), "vendor_a"));
        assert!(!merged.resolve("price", &FieldValue::Number(200.0), "vendor_b"));
        assert_eq!(merged.number("price"), Some(100.0));
        assert_eq!(merged.source_of("price"), Some("vendor_a"));

        let required = vec!["price".to_string(), "eps_ttm".to_string()];
        assert_eq!(merged.missing(&required), vec!["eps_ttm".to_string()]);
    }

    #[test]
    fn test_weight_set_normalization() {
        let mut raw = BTreeMap::new();
        raw.insert("a".to_string(), 0.14);
        raw.insert("b".to_string(), 0.8);
        let ws = WeightSet::normalized(raw);
        assert!((ws.sum() - 1.0).abs() < 1e-12);
        assert!((ws.get("a") - 0.1489).abs() < 1e-4);
        assert_eq!(ws.get("missing"), 0.0);
    }

    #[test]
    fn test_weight_set_all_zero_splits_evenly() {
        let mut raw = BTreeMap::new();
        raw.insert("a".to_string(), 0.0);
        raw.insert("b".to_string(), -1.0);
        let ws = WeightSet::normalized(raw);
        assert_eq!(ws.get("a"), 0.5);
        assert_eq!(ws.get("b"), 0.5);
    }

    #[test]
    fn test_strategy_result_participation() {
        let t = Ticker::new("X").unwrap();
        assert_eq!(
            StrategyResult::valued(t.clone(), "s", 10.0, 0.5).participating_value(),
            Some(10.0)
        );
        assert_eq!(
            StrategyResult::valued(t.clone(), "s", f64::INFINITY, 0.5).participating_value(),
            None
        );
        assert_eq!(StrategyResult::declined(t, "s", "no eps").participating_value(), None);
    }
}
