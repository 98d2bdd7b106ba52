use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use common::{AggregationMode, FieldValue, StrategyCategory};

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FairvalConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub universe: UniverseConfig,
    #[serde(default)]
    pub adapters: AdaptersConfig,
    #[serde(default)]
    pub strategies: StrategiesConfig,
    #[serde(default)]
    pub scoring_service: ScoringServiceConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
    #[serde(default)]
    pub weighting: WeightingConfig,
    #[serde(default)]
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Prometheus exporter; disabled when absent
    #[serde(default)]
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Once,
    Continuous,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunConfig {
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Run immediately instead of waiting one interval
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Once,
            interval_seconds: default_interval_seconds(),
            run_on_startup: true,
        }
    }
}

impl RunConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UniverseConfig {
    #[serde(default)]
    pub tickers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdaptersConfig {
    /// Highest priority first
    #[serde(default = "default_adapter_priority")]
    pub priority: Vec<String>,
    #[serde(default = "default_adapter_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub mock: MockAdapterConfig,
    #[serde(rename = "static", default)]
    pub static_sources: Vec<StaticSourceConfig>,
}

impl Default for AdaptersConfig {
    fn default() -> Self {
        Self {
            priority: default_adapter_priority(),
            timeout_seconds: default_adapter_timeout_seconds(),
            mock: MockAdapterConfig::default(),
            static_sources: Vec::new(),
        }
    }
}

impl AdaptersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MockAdapterConfig {
    #[serde(default)]
    pub latency_ms: u64,
    /// Tickers the mock adapter pretends not to cover
    #[serde(default)]
    pub missing_tickers: Vec<String>,
}

/// Fixed per-ticker values served by a named static adapter
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StaticSourceConfig {
    pub name: String,
    #[serde(default)]
    pub records: BTreeMap<String, BTreeMap<String, Option<FieldValue>>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StrategiesConfig {
    #[serde(default = "default_enabled_strategies")]
    pub enabled: Vec<String>,
    #[serde(default = "default_strategy_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub hyperparams: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub remote: Vec<RemoteStrategyConfig>,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_strategies(),
            timeout_seconds: default_strategy_timeout_seconds(),
            hyperparams: BTreeMap::new(),
            remote: Vec::new(),
        }
    }
}

impl StrategiesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Strategy evaluated by the scoring service
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RemoteStrategyConfig {
    pub name: String,
    pub category: StrategyCategory,
    #[serde(default)]
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScoringServiceConfig {
    #[serde(default = "default_scoring_base_url")]
    pub base_url: String,
    #[serde(default = "default_scoring_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ScoringServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_scoring_base_url(),
            timeout_seconds: default_scoring_timeout_seconds(),
        }
    }
}

impl ScoringServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConsensusConfig {
    #[serde(default)]
    pub aggregation: AggregationMode,
    #[serde(default = "default_min_mos")]
    pub min_mos: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationMode::default(),
            min_mos: default_min_mos(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WeightingConfig {
    #[serde(default = "default_low_margin_threshold")]
    pub low_margin_threshold: f64,
    #[serde(default = "default_high_margin_threshold")]
    pub high_margin_threshold: f64,
    #[serde(default = "default_negative_growth_penalty")]
    pub negative_growth_penalty: f64,
    #[serde(default = "default_high_growth_threshold")]
    pub high_growth_threshold: f64,
    #[serde(default = "default_high_growth_boost")]
    pub high_growth_boost: f64,
    #[serde(default = "default_low_margin_weight")]
    pub low_margin_weight: f64,
    #[serde(default = "default_medium_margin_weight")]
    pub medium_margin_weight: f64,
    #[serde(default = "default_high_margin_weight")]
    pub high_margin_weight: f64,
    #[serde(default = "default_earnings_override_weight")]
    pub earnings_override_weight: f64,
    #[serde(default = "default_category_weight")]
    pub default_growth_weight: f64,
    #[serde(default = "default_category_weight")]
    pub default_reversion_weight: f64,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            low_margin_threshold: default_low_margin_threshold(),
            high_margin_threshold: default_high_margin_threshold(),
            negative_growth_penalty: default_negative_growth_penalty(),
            high_growth_threshold: default_high_growth_threshold(),
            high_growth_boost: default_high_growth_boost(),
            low_margin_weight: default_low_margin_weight(),
            medium_margin_weight: default_medium_margin_weight(),
            high_margin_weight: default_high_margin_weight(),
            earnings_override_weight: default_earnings_override_weight(),
            default_growth_weight: default_category_weight(),
            default_reversion_weight: default_category_weight(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputsConfig {
    /// Any of console, json, http, broadcast, gui
    #[serde(default = "default_output_modes")]
    pub modes: Vec<String>,
    #[serde(default = "default_json_path")]
    pub json_path: PathBuf,
    #[serde(default = "default_console_limit")]
    pub console_limit: usize,
    #[serde(default)]
    pub http: Option<EndpointConfig>,
    #[serde(default)]
    pub broadcast: Option<EndpointConfig>,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            modes: default_output_modes(),
            json_path: default_json_path(),
            console_limit: default_console_limit(),
            http: None,
            broadcast: None,
        }
    }
}

impl OutputsConfig {
    pub fn has_mode(&self, mode: &str) -> bool {
        self.modes.iter().any(|m| m.eq_ignore_ascii_case(mode))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
}

impl EndpointConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// pretty, json or compact
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml_fills_defaults() {
        let config: FairvalConfig = serde_yaml::from_str("universe:\n  tickers: [AAPL]\n").unwrap();

        assert_eq!(config.universe.tickers, vec!["AAPL"]);
        assert_eq!(config.run.mode, RunMode::Once);
        assert_eq!(config.run.interval_seconds, 180);
        assert_eq!(config.adapters.priority, vec!["mock"]);
        assert_eq!(config.strategies.enabled.len(), 3);
        assert_eq!(config.consensus.aggregation, AggregationMode::WeightedAverage);
        assert_eq!(config.consensus.min_mos, 0.20);
        assert_eq!(config.weighting, WeightingConfig::default());
        assert_eq!(config.outputs.modes, vec!["console"]);
        assert!(config.monitoring.is_none());
    }

    #[test]
    fn test_static_records_and_remote_strategies() {
        let yaml = r#"
adapters:
  priority: [vendorA, mock]
  static:
    - name: vendorA
      records:
        ACME:
          price: 100.0
          sector: Industrials
          eps_ttm: null
strategies:
  enabled: [dcf]
  remote:
    - name: dcf
      category: growth_sensitive
      required_fields: [eps_ttm]
consensus:
  aggregation: median
"#;
        let config: FairvalConfig = serde_yaml::from_str(yaml).unwrap();

        let source = &config.adapters.static_sources[0];
        let acme = &source.records["ACME"];
        assert_eq!(acme["price"], Some(FieldValue::Number(100.0)));
        assert_eq!(acme["sector"], Some(FieldValue::Text("Industrials".into())));
        assert_eq!(acme["eps_ttm"], None);

        let remote = &config.strategies.remote[0];
        assert_eq!(remote.category, StrategyCategory::GrowthSensitive);
        assert_eq!(config.consensus.aggregation, AggregationMode::Median);
    }

    #[test]
    fn test_output_mode_lookup_ignores_case() {
        let outputs = OutputsConfig {
            modes: vec!["Console".into(), "JSON".into()],
            ..OutputsConfig::default()
        };
        assert!(outputs.has_mode("json"));
        assert!(!outputs.has_mode("http"));
    }
}
