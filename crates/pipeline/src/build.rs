//! Pipeline construction from configuration

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use adapters::{AdapterRegistry, FetchOrchestrator, MockAdapter, StaticAdapter};
use common::{Error, Result, Ticker};
use config::{
    AdaptersConfig, ConsensusConfig, FairvalConfig, OutputsConfig, ScoringServiceConfig,
    StrategiesConfig, WeightingConfig, MOCK_ADAPTER,
};
use consensus::{Aggregator, ConsensusEngine, WeightingEngine, WeightingPolicy};
use publish::{SinkFanout, SinkSettings, SnapshotStore};
use strategies::local::{self, Hyperparams};
use strategies::{Evaluator, HttpScoringClient, RemoteStrategy, ScoringClient, StrategyRegistry};

use crate::pipeline::Pipeline;

/// Mock adapter plus one static adapter per configured source
pub fn adapter_registry(config: &AdaptersConfig) -> Result<AdapterRegistry> {
    let mut mock = MockAdapter::new()
        .with_name(MOCK_ADAPTER)
        .with_latency(Duration::from_millis(config.mock.latency_ms));
    for ticker in &config.mock.missing_tickers {
        mock = mock.without_ticker(Ticker::new(ticker)?.as_str());
    }

    let mut registry = AdapterRegistry::new().with(mock);
    for source in &config.static_sources {
        let mut adapter = StaticAdapter::new(&source.name);
        for (symbol, fields) in &source.records {
            adapter = adapter.with_record(Ticker::new(symbol)?, fields.clone());
        }
        debug!(adapter = %source.name, tickers = adapter.len(), "Static adapter configured");
        registry.register(Arc::new(adapter));
    }
    Ok(registry)
}

/// Every built-in strategy plus the configured remote ones
pub fn strategy_registry(
    config: &StrategiesConfig,
    scoring: &ScoringServiceConfig,
) -> Result<StrategyRegistry> {
    let mut registry = StrategyRegistry::new();
    let empty = Hyperparams::new();
    for name in local::BUILTIN {
        let params = config.hyperparams.get(name).unwrap_or(&empty);
        if let Some(strategy) = local::builtin(name, params) {
            registry.register(strategy);
        }
    }

    if !config.remote.is_empty() {
        let client: Arc<dyn ScoringClient> = Arc::new(
            HttpScoringClient::new(&scoring.base_url, scoring.timeout())
                .map_err(|e| Error::config(format!("scoring service client: {}", e)))?,
        );
        for remote in &config.remote {
            info!(strategy = %remote.name, url = %scoring.base_url, "Remote strategy configured");
            registry.register(Arc::new(RemoteStrategy::new(
                &remote.name,
                remote.category,
                remote.required_fields.iter().cloned().collect(),
                Arc::clone(&client),
            )));
        }
    }
    Ok(registry)
}

pub fn weighting_policy(config: &WeightingConfig) -> WeightingPolicy {
    WeightingPolicy {
        low_margin_threshold: config.low_margin_threshold,
        high_margin_threshold: config.high_margin_threshold,
        negative_growth_penalty: config.negative_growth_penalty,
        high_growth_threshold: config.high_growth_threshold,
        high_growth_boost: config.high_growth_boost,
        low_margin_weight: config.low_margin_weight,
        medium_margin_weight: config.medium_margin_weight,
        high_margin_weight: config.high_margin_weight,
        earnings_override_weight: config.earnings_override_weight,
        default_growth_weight: config.default_growth_weight,
        default_reversion_weight: config.default_reversion_weight,
    }
}

pub fn aggregator(config: &ConsensusConfig) -> Aggregator {
    Aggregator::new(config.aggregation, config.min_mos)
}

pub fn sink_settings(config: &OutputsConfig, store: Option<Arc<SnapshotStore>>) -> SinkSettings {
    SinkSettings {
        console_limit: config.console_limit,
        json_path: config.json_path.clone(),
        broadcast_target: config.broadcast.as_ref().map(|b| b.address()),
        store,
    }
}

/// Wire a complete pipeline.
///
/// `store` backs the `http` output mode and is required when it is enabled.
pub fn build_pipeline(config: &FairvalConfig, store: Option<Arc<SnapshotStore>>) -> Result<Pipeline> {
    let adapters = adapter_registry(&config.adapters)?;
    let strategies = strategy_registry(&config.strategies, &config.scoring_service)?;
    let sinks = SinkFanout::from_modes(&config.outputs.modes, &sink_settings(&config.outputs, store))?;

    info!(
        adapters = ?adapters.names(),
        strategies = ?strategies.names(),
        sinks = ?sinks.names(),
        "Pipeline configured"
    );

    Ok(Pipeline::new(
        FetchOrchestrator::new(Arc::new(adapters), config.adapters.timeout()),
        Evaluator::new(Arc::new(strategies), config.strategies.timeout()),
        ConsensusEngine::new(
            WeightingEngine::new(&weighting_policy(&config.weighting)),
            aggregator(&config.consensus),
        ),
        sinks,
        config.adapters.priority.clone(),
        config.strategies.enabled.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use common::{AggregationMode, FieldValue, StrategyCategory};
    use config::{generate_default_config, RemoteStrategyConfig, StaticSourceConfig};
    use std::collections::BTreeMap;
    use tokio_util::sync::CancellationToken;

    fn quiet_config() -> FairvalConfig {
        let mut config = generate_default_config();
        config.outputs.modes.clear();
        config
    }

    #[test]
    fn test_registries_from_default_config() {
        let config = quiet_config();
        let adapters = adapter_registry(&config.adapters).unwrap();
        assert_eq!(adapters.names().into_iter().collect::<Vec<_>>(), vec!["mock"]);

        let strategies = strategy_registry(&config.strategies, &config.scoring_service).unwrap();
        assert_eq!(strategies.len(), 3);
        assert!(strategies.contains("graham_number"));
    }

    #[test]
    fn test_remote_strategies_are_registered() {
        let mut config = quiet_config();
        config.strategies.remote.push(RemoteStrategyConfig {
            name: "dcf".into(),
            category: StrategyCategory::GrowthSensitive,
            required_fields: vec!["eps_ttm".into()],
        });

        let registry = strategy_registry(&config.strategies, &config.scoring_service).unwrap();
        let dcf = registry.get("dcf").unwrap();
        assert_eq!(dcf.category(), StrategyCategory::GrowthSensitive);
        assert!(dcf.required_fields().contains("eps_ttm"));
    }

    #[test]
    fn test_gui_output_is_rejected() {
        let mut config = quiet_config();
        config.outputs.modes = vec!["gui".into()];
        assert_matches!(
            build_pipeline(&config, None).err(),
            Some(Error::SinkNotImplemented(_))
        );
    }

    #[test]
    fn test_policy_mirrors_config() {
        let mut config = quiet_config();
        config.weighting.negative_growth_penalty = 0.5;
        config.consensus.aggregation = AggregationMode::Median;

        assert_eq!(weighting_policy(&config.weighting).negative_growth_penalty, 0.5);
        assert_eq!(aggregator(&config.consensus).mode(), AggregationMode::Median);
        assert_eq!(
            weighting_policy(&WeightingConfig::default()),
            WeightingPolicy::default()
        );
    }

    #[tokio::test]
    async fn test_static_source_outranks_mock() {
        let mut config = quiet_config();
        config.adapters.priority = vec!["manual".into(), "mock".into()];
        config.adapters.static_sources.push(StaticSourceConfig {
            name: "manual".into(),
            records: BTreeMap::from([(
                "aapl".to_string(),
                BTreeMap::from([
                    ("price".to_string(), Some(FieldValue::Number(1.0))),
                    ("growth_5y_est".to_string(), None),
                ]),
            )]),
        });
        config.adapters.mock.missing_tickers = vec!["msft".into()];

        let pipeline = build_pipeline(&config, None).unwrap();
        let tickers = Ticker::parse_list(["AAPL", "MSFT"]).unwrap();
        let outcome = pipeline
            .run_once(&tickers, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.snapshot.records.len(), 1);
        let aapl = &outcome.snapshot.records[0];
        assert_eq!(aapl.price, Some(1.0));
        assert!(aapl.undervalued);
        assert_eq!(outcome.report.count(common::IssueKind::IncompleteTicker), 1);
    }
}
