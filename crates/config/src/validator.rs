use crate::*;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("adapters.priority must name at least one adapter")]
    NoAdapters,

    #[error("Adapter '{0}' in adapters.priority is neither 'mock' nor a configured static source")]
    UnknownAdapter(String),

    #[error("strategies.enabled must name at least one strategy")]
    NoStrategies,

    #[error("Duplicate name '{name}' in {section}")]
    DuplicateName { section: String, name: String },

    #[error("Invalid ticker '{ticker}' in {section}")]
    InvalidTicker { section: String, ticker: String },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: String },

    #[error("{field} must be a non-negative number, got {value}")]
    NegativeValue { field: String, value: f64 },

    #[error("{field} must be between 0 and 1, got {value}")]
    OutOfUnitRange { field: String, value: f64 },

    #[error("weighting.low_margin_threshold ({low}) must not exceed weighting.high_margin_threshold ({high})")]
    ThresholdOrder { low: f64, high: f64 },

    #[error("weighting default weights must not both be zero")]
    ZeroDefaultWeights,

    #[error("consensus.min_mos must be below 1, got {0}")]
    InvalidMinMos(f64),

    #[error("scoring_service.base_url '{url}' is invalid: {message}")]
    InvalidScoringUrl { url: String, message: String },

    #[error("Unknown output mode '{0}'. Must be one of: console, json, http, broadcast, gui")]
    UnknownOutputMode(String),

    #[error("Output mode '{0}' is not implemented")]
    OutputModeNotImplemented(String),

    #[error("Output mode '{mode}' requires outputs.{mode} host and port")]
    MissingEndpoint { mode: String },

    #[error("{first} and {second} both use port {port}")]
    PortConflict {
        first: String,
        second: String,
        port: u16,
    },

    #[error("Invalid log format '{0}'. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("{low_field} ({low}) must not exceed {high_field} ({high})")]
    BoundsOrder {
        low_field: String,
        high_field: String,
        low: f64,
        high: f64,
    },

    #[error("Environment variable '{var}' is missing for {field}")]
    UnresolvedEnvVar { field: String, var: String },
}

/// Hyperparameter pairs that clamp a multiple
const HYPERPARAM_BOUNDS: &[(&str, &str)] = &[("min_pe", "max_pe"), ("min_ps", "max_ps")];

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &FairvalConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_run(&config.run, &mut report);
    validate_universe(&config.universe, &mut report);
    validate_adapters(&config.adapters, &mut report);
    validate_strategies(&config.strategies, &mut report);
    if !config.strategies.remote.is_empty() {
        validate_scoring_service(&config.scoring_service, &mut report);
    }
    validate_consensus(&config.consensus, &mut report);
    validate_weighting(&config.weighting, &mut report);
    validate_outputs(&config.outputs, &mut report);
    validate_observability(config, &mut report);

    report
}

fn validate_run(run: &RunConfig, report: &mut ValidationReport) {
    if run.mode == RunMode::Continuous && run.interval_seconds == 0 {
        report.add_error(ValidationError::ZeroDuration {
            field: "run.interval_seconds".to_string(),
        });
    }
}

fn validate_universe(universe: &UniverseConfig, report: &mut ValidationReport) {
    if universe.tickers.is_empty() {
        report.add_warning(
            "universe.tickers",
            "No tickers configured; pass --tickers on the command line",
        );
        return;
    }

    let mut seen = HashSet::new();
    for raw in &universe.tickers {
        match common::Ticker::new(raw) {
            Ok(ticker) => {
                if !seen.insert(ticker.clone()) {
                    report.add_warning(
                        "universe.tickers",
                        &format!("Duplicate ticker '{}' is evaluated once", ticker),
                    );
                }
            }
            Err(_) => report.add_error(ValidationError::InvalidTicker {
                section: "universe.tickers".to_string(),
                ticker: raw.clone(),
            }),
        }
    }
}

fn validate_adapters(adapters: &AdaptersConfig, report: &mut ValidationReport) {
    if adapters.priority.is_empty() {
        report.add_error(ValidationError::NoAdapters);
    }
    check_duplicates("adapters.priority", &adapters.priority, report);

    if adapters.timeout_seconds == 0 {
        report.add_error(ValidationError::ZeroDuration {
            field: "adapters.timeout_seconds".to_string(),
        });
    }

    let static_names: Vec<String> = adapters
        .static_sources
        .iter()
        .map(|s| s.name.clone())
        .collect();
    check_duplicates("adapters.static", &static_names, report);
    if static_names.iter().any(|n| n == MOCK_ADAPTER) {
        report.add_error(ValidationError::DuplicateName {
            section: "adapters.static".to_string(),
            name: MOCK_ADAPTER.to_string(),
        });
    }

    for name in &adapters.priority {
        if name != MOCK_ADAPTER && !static_names.contains(name) {
            report.add_error(ValidationError::UnknownAdapter(name.clone()));
        }
    }

    for source in &adapters.static_sources {
        if !adapters.priority.contains(&source.name) {
            report.add_warning(
                "adapters.static",
                &format!("Static source '{}' is not in adapters.priority and is never fetched", source.name),
            );
        }
        for ticker in source.records.keys() {
            if common::Ticker::new(ticker).is_err() {
                report.add_error(ValidationError::InvalidTicker {
                    section: format!("adapters.static.{}", source.name),
                    ticker: ticker.clone(),
                });
            }
        }
    }
}

fn validate_strategies(strategies: &StrategiesConfig, report: &mut ValidationReport) {
    if strategies.enabled.is_empty() {
        report.add_error(ValidationError::NoStrategies);
    }
    check_duplicates("strategies.enabled", &strategies.enabled, report);

    if strategies.timeout_seconds == 0 {
        report.add_error(ValidationError::ZeroDuration {
            field: "strategies.timeout_seconds".to_string(),
        });
    }

    let remote_names: Vec<String> = strategies.remote.iter().map(|r| r.name.clone()).collect();
    check_duplicates("strategies.remote", &remote_names, report);

    for remote in &strategies.remote {
        if remote.required_fields.is_empty() {
            report.add_warning(
                &format!("strategies.remote.{}", remote.name),
                "No required_fields; every ticker is sent to the scoring service",
            );
        }
        if !strategies.enabled.contains(&remote.name) {
            report.add_warning(
                "strategies.remote",
                &format!("Remote strategy '{}' is registered but not enabled", remote.name),
            );
        }
    }

    for (name, params) in &strategies.hyperparams {
        if !strategies.enabled.contains(name) {
            report.add_warning(
                "strategies.hyperparams",
                &format!("Hyperparameters for '{}' are unused; the strategy is not enabled", name),
            );
        }
        for (key, value) in params {
            if !value.is_finite() {
                report.add_error(ValidationError::NegativeValue {
                    field: format!("strategies.hyperparams.{}.{}", name, key),
                    value: *value,
                });
            }
        }
        for (low_key, high_key) in HYPERPARAM_BOUNDS {
            if let (Some(&low), Some(&high)) = (params.get(*low_key), params.get(*high_key)) {
                if low > high {
                    report.add_error(ValidationError::BoundsOrder {
                        low_field: format!("strategies.hyperparams.{}.{}", name, low_key),
                        high_field: format!("strategies.hyperparams.{}.{}", name, high_key),
                        low,
                        high,
                    });
                }
            }
        }
    }

    for name in &strategies.enabled {
        if !strategies.hyperparams.contains_key(name) && !remote_names.contains(name) {
            report.add_default(&format!("strategies.hyperparams.{}", name), "built-in defaults");
        }
    }
}

fn validate_scoring_service(service: &ScoringServiceConfig, report: &mut ValidationReport) {
    if service.timeout_seconds == 0 {
        report.add_error(ValidationError::ZeroDuration {
            field: "scoring_service.timeout_seconds".to_string(),
        });
    }

    check_env_resolved("scoring_service.base_url", &service.base_url, report);
    match url::Url::parse(&service.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => report.add_error(ValidationError::InvalidScoringUrl {
            url: service.base_url.clone(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => report.add_error(ValidationError::InvalidScoringUrl {
            url: service.base_url.clone(),
            message: e.to_string(),
        }),
    }
}

fn validate_consensus(consensus: &ConsensusConfig, report: &mut ValidationReport) {
    if !consensus.min_mos.is_finite() || consensus.min_mos >= 1.0 {
        report.add_error(ValidationError::InvalidMinMos(consensus.min_mos));
    } else if consensus.min_mos < 0.0 {
        report.add_warning(
            "consensus.min_mos",
            "Negative threshold marks overvalued tickers as undervalued",
        );
    }
}

fn validate_weighting(weighting: &WeightingConfig, report: &mut ValidationReport) {
    if weighting.low_margin_threshold > weighting.high_margin_threshold {
        report.add_error(ValidationError::ThresholdOrder {
            low: weighting.low_margin_threshold,
            high: weighting.high_margin_threshold,
        });
    }

    check_unit_range(
        "weighting.negative_growth_penalty",
        weighting.negative_growth_penalty,
        report,
    );
    check_non_negative("weighting.high_growth_boost", weighting.high_growth_boost, report);

    for (field, value) in [
        ("weighting.low_margin_weight", weighting.low_margin_weight),
        ("weighting.medium_margin_weight", weighting.medium_margin_weight),
        ("weighting.high_margin_weight", weighting.high_margin_weight),
        ("weighting.earnings_override_weight", weighting.earnings_override_weight),
    ] {
        check_unit_range(field, value, report);
    }

    check_non_negative("weighting.default_growth_weight", weighting.default_growth_weight, report);
    check_non_negative(
        "weighting.default_reversion_weight",
        weighting.default_reversion_weight,
        report,
    );
    if weighting.default_growth_weight + weighting.default_reversion_weight <= 0.0 {
        report.add_error(ValidationError::ZeroDefaultWeights);
    }
}

fn validate_outputs(outputs: &OutputsConfig, report: &mut ValidationReport) {
    if outputs.modes.is_empty() {
        report.add_warning("outputs.modes", "No outputs configured; results are only logged");
    }

    let modes: Vec<String> = outputs.modes.iter().map(|m| m.to_ascii_lowercase()).collect();
    check_duplicates("outputs.modes", &modes, report);

    for mode in &modes {
        if !OUTPUT_MODES.contains(&mode.as_str()) {
            report.add_error(ValidationError::UnknownOutputMode(mode.clone()));
        }
    }

    if outputs.has_mode("gui") {
        report.add_error(ValidationError::OutputModeNotImplemented("gui".to_string()));
    }
    if outputs.has_mode("http") && outputs.http.is_none() {
        report.add_error(ValidationError::MissingEndpoint {
            mode: "http".to_string(),
        });
    }
    if outputs.has_mode("broadcast") && outputs.broadcast.is_none() {
        report.add_error(ValidationError::MissingEndpoint {
            mode: "broadcast".to_string(),
        });
    }
    if outputs.has_mode("json") {
        check_env_resolved(
            "outputs.json_path",
            &outputs.json_path.to_string_lossy(),
            report,
        );
    }
    if outputs.has_mode("console") && outputs.console_limit == 0 {
        report.add_warning("outputs.console_limit", "Console table is limited to zero rows");
    }
}

fn validate_observability(config: &FairvalConfig, report: &mut ValidationReport) {
    if !matches!(config.logging.format.as_str(), "pretty" | "json" | "compact") {
        report.add_error(ValidationError::InvalidLogFormat(config.logging.format.clone()));
    }

    match &config.monitoring {
        None => report.add_default("monitoring", "metrics exporter disabled"),
        Some(monitoring) => {
            if let Some(http) = config.outputs.http.as_ref().filter(|_| config.outputs.has_mode("http")) {
                if http.port == monitoring.metrics_port {
                    report.add_error(ValidationError::PortConflict {
                        first: "outputs.http.port".to_string(),
                        second: "monitoring.metrics_port".to_string(),
                        port: http.port,
                    });
                }
            }
        }
    }
}

fn check_duplicates(section: &str, names: &[String], report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            report.add_error(ValidationError::DuplicateName {
                section: section.to_string(),
                name: name.clone(),
            });
        }
    }
}

fn check_unit_range(field: &str, value: f64, report: &mut ValidationReport) {
    if !(0.0..=1.0).contains(&value) {
        report.add_error(ValidationError::OutOfUnitRange {
            field: field.to_string(),
            value,
        });
    }
}

fn check_non_negative(field: &str, value: f64, report: &mut ValidationReport) {
    if !value.is_finite() || value < 0.0 {
        report.add_error(ValidationError::NegativeValue {
            field: field.to_string(),
            value,
        });
    }
}

fn check_env_resolved(field: &str, value: &str, report: &mut ValidationReport) {
    if let Ok(vars) = substitution::unresolved_env_vars(value) {
        for var in vars {
            report.add_error(ValidationError::UnresolvedEnvVar {
                field: field.to_string(),
                var,
            });
        }
    }
}
