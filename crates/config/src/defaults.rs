use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/fairval.yaml";

/// Adapter registered on every run, independent of the config
pub const MOCK_ADAPTER: &str = "mock";

pub const OUTPUT_MODES: &[&str] = &["console", "json", "http", "broadcast", "gui"];

pub fn default_true() -> bool {
    true
}

pub fn default_interval_seconds() -> u64 {
    180
}

pub fn default_adapter_priority() -> Vec<String> {
    vec![MOCK_ADAPTER.to_string()]
}

pub fn default_adapter_timeout_seconds() -> u64 {
    10
}

pub fn default_enabled_strategies() -> Vec<String> {
    vec![
        "peter_lynch".to_string(),
        "psales_rev".to_string(),
        "graham_number".to_string(),
    ]
}

pub fn default_strategy_timeout_seconds() -> u64 {
    30
}

pub fn default_hyperparams() -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut params = BTreeMap::new();
    params.insert(
        "peter_lynch".to_string(),
        BTreeMap::from([
            ("min_pe".to_string(), 5.0),
            ("max_pe".to_string(), 35.0),
        ]),
    );
    params.insert(
        "psales_rev".to_string(),
        BTreeMap::from([("target_ps".to_string(), 3.0)]),
    );
    params.insert(
        "graham_number".to_string(),
        BTreeMap::from([
            ("pe_cap".to_string(), 15.0),
            ("pb_cap".to_string(), 1.5),
        ]),
    );
    params
}

pub fn default_scoring_base_url() -> String {
    "http://localhost:8000".to_string()
}

pub fn default_scoring_timeout_seconds() -> u64 {
    10
}

pub fn default_min_mos() -> f64 {
    0.20
}

pub fn default_low_margin_threshold() -> f64 {
    0.05
}

pub fn default_high_margin_threshold() -> f64 {
    0.10
}

pub fn default_negative_growth_penalty() -> f64 {
    0.3
}

pub fn default_high_growth_threshold() -> f64 {
    0.15
}

pub fn default_high_growth_boost() -> f64 {
    0.2
}

pub fn default_low_margin_weight() -> f64 {
    0.2
}

pub fn default_medium_margin_weight() -> f64 {
    0.6
}

pub fn default_high_margin_weight() -> f64 {
    0.8
}

pub fn default_earnings_override_weight() -> f64 {
    0.1
}

pub fn default_category_weight() -> f64 {
    0.5
}

pub fn default_output_modes() -> Vec<String> {
    vec!["console".to_string()]
}

pub fn default_json_path() -> PathBuf {
    PathBuf::from("output/fair_values.json")
}

pub fn default_console_limit() -> usize {
    25
}

pub fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_http_port() -> u16 {
    8080
}

pub fn default_broadcast_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_broadcast_port() -> u16 {
    9999
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}
