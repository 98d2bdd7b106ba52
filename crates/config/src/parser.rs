use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FairvalConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());
    parse_config(&content)
}

/// Substitute environment variables and parse YAML
pub fn parse_config(content: &str) -> Result<FairvalConfig> {
    let substituted = substitution::substitute_env_vars(content)?;
    debug!("Environment variable substitution completed");

    let config: FairvalConfig = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;

    info!("Configuration loaded successfully");
    Ok(config)
}

#[instrument]
pub fn generate_default_config() -> FairvalConfig {
    FairvalConfig {
        run: RunConfig::default(),
        universe: UniverseConfig {
            tickers: ["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA"]
                .into_iter()
                .map(String::from)
                .collect(),
        },
        adapters: AdaptersConfig::default(),
        strategies: StrategiesConfig {
            hyperparams: default_hyperparams(),
            ..StrategiesConfig::default()
        },
        scoring_service: ScoringServiceConfig::default(),
        consensus: ConsensusConfig::default(),
        weighting: WeightingConfig::default(),
        outputs: OutputsConfig {
            modes: vec!["console".to_string(), "json".to_string()],
            http: Some(EndpointConfig::new(default_http_host(), default_http_port())),
            broadcast: Some(EndpointConfig::new(
                default_broadcast_host(),
                default_broadcast_port(),
            )),
            ..OutputsConfig::default()
        },
        logging: LoggingConfig::default(),
        monitoring: None,
    }
}

#[instrument(skip(config))]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &FairvalConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    fs::write(path, yaml).with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fairval.yaml");

        let config = generate_default_config();
        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();

        assert_eq!(loaded, config);
        assert!(validate_config(&loaded).is_valid());
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = load_config("/nonexistent/fairval.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_parse_substitutes_env() {
        std::env::set_var("FAIRVAL_TEST_MIN_MOS", "0.35");
        let config = parse_config("consensus:\n  min_mos: ${FAIRVAL_TEST_MIN_MOS}\n").unwrap();
        assert_eq!(config.consensus.min_mos, 0.35);
    }

    #[test]
    fn test_parse_rejects_unknown_aggregation() {
        let err = parse_config("consensus:\n  aggregation: mode\n").unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML"));
    }
}
