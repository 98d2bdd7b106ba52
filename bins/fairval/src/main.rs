//! fairval CLI and results server binary
//!
//! Entry point for running the valuation pipeline once or continuously,
//! validating and generating configuration files, and listing what a
//! configuration registers.

use anyhow::{Context, Result};
use cli::{AggregationArg, Cli, Commands, LogFormatArg};
use common::{AggregationMode, Ticker};
use config::{
    generate_default_config, load_config, save_config, validate_config, FairvalConfig, RunMode,
    ValidationReport,
};
use observability::{init_logging, init_metrics, LogFormat};
use pipeline::{adapter_registry, build_pipeline, run_continuous, strategy_registry};
use publish::{results_router, SnapshotStore};
use server::{HealthState, HttpServer, ServerConfig, ServerExt, ShutdownController};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const SERVICE_NAME: &str = "fairval";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Run {
            config,
            once,
            tickers,
            min_mos,
            aggregation,
            output,
        } => {
            let overrides = Overrides {
                once,
                tickers,
                min_mos,
                aggregation,
                output,
            };
            run_command(config, overrides, cli.log_format).await
        }
        Commands::Validate { config } => {
            init_logging(SERVICE_NAME, log_format(cli.log_format, None))?;
            info!("Executing 'validate' command");
            validate_command(config)
        }
        Commands::Init { output, force } => {
            init_logging(SERVICE_NAME, log_format(cli.log_format, None))?;
            info!("Executing 'init' command");
            init_command(output, force)
        }
        Commands::Registry { config } => {
            init_logging(SERVICE_NAME, log_format(cli.log_format, None))?;
            info!("Executing 'registry' command");
            registry_command(config)
        }
    }
}

/// `--log-format` wins over `logging.format`
fn log_format(flag: Option<LogFormatArg>, config: Option<&FairvalConfig>) -> LogFormat {
    flag.map(|f| f.as_str())
        .or_else(|| config.map(|c| c.logging.format.as_str()))
        .and_then(LogFormat::parse)
        .unwrap_or_default()
}

/// Command-line values replacing parts of the loaded configuration
struct Overrides {
    once: bool,
    tickers: Vec<String>,
    min_mos: Option<f64>,
    aggregation: Option<AggregationArg>,
    output: Vec<String>,
}

impl Overrides {
    fn apply(self, config: &mut FairvalConfig) {
        if self.once {
            config.run.mode = RunMode::Once;
        }
        if !self.tickers.is_empty() {
            config.universe.tickers = self.tickers;
        }
        if let Some(min_mos) = self.min_mos {
            config.consensus.min_mos = min_mos;
        }
        if let Some(aggregation) = self.aggregation {
            config.consensus.aggregation = match aggregation {
                AggregationArg::WeightedAverage => AggregationMode::WeightedAverage,
                AggregationArg::Median => AggregationMode::Median,
            };
        }
        if !self.output.is_empty() {
            config.outputs.modes = self.output;
        }
    }
}

fn log_report(report: &ValidationReport) {
    for default in &report.defaults_applied {
        debug!(field = %default.field, value = %default.value, "Default applied");
    }
    if !report.warnings.is_empty() {
        warn!("Configuration warnings:");
        for warning in &report.warnings {
            warn!(field = %warning.field, message = %warning.message);
        }
    }
}

async fn run_command(
    config_path: PathBuf,
    overrides: Overrides,
    log_flag: Option<LogFormatArg>,
) -> Result<()> {
    let mut config = load_config(&config_path)?;
    overrides.apply(&mut config);

    init_logging(SERVICE_NAME, log_format(log_flag, Some(&config)))?;
    info!(path = ?config_path, "fairval starting...");

    let report = validate_config(&config);
    log_report(&report);
    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot run due to configuration errors");
    }

    let tickers = Ticker::parse_list(&config.universe.tickers)?;
    if tickers.is_empty() {
        warn!("Ticker universe is empty; the run will publish no results");
    }

    let shutdown = ShutdownController::with_ctrl_c();

    if let Some(monitoring) = &config.monitoring {
        let addr = SocketAddr::from(([0, 0, 0, 0], monitoring.metrics_port));
        init_metrics(addr)?;
    }

    let health = Arc::new(HealthState::new(SERVICE_NAME));
    let store = Arc::new(SnapshotStore::new());

    let http_endpoint = config
        .outputs
        .http
        .as_ref()
        .filter(|_| config.outputs.has_mode("http"));
    let results_server = match http_endpoint {
        Some(endpoint) => {
            let server = HttpServer::new(
                "results",
                ServerConfig::new(&endpoint.host, endpoint.port),
                results_router(store.clone(), health.clone()),
            );
            let mut handle = server.clone().spawn_with(shutdown.child_token());
            tokio::select! {
                addr = server.wait_ready() => {
                    info!(%addr, "Results API listening (/results, /stream, /health)");
                }
                joined = &mut handle => {
                    let err = match joined.context("Results API task panicked")? {
                        Ok(()) => anyhow::bail!("Results API stopped before accepting connections"),
                        Err(e) => e,
                    };
                    if err.is_port_in_use() {
                        anyhow::bail!(
                            "Port {} is already in use; change outputs.http.port",
                            endpoint.port
                        );
                    }
                    return Err(err)
                        .with_context(|| format!("Results API failed on {}", endpoint.address()));
                }
            }
            Some(handle)
        }
        None => None,
    };

    let pipeline = build_pipeline(&config, Some(store))?.with_health(health);

    match config.run.mode {
        RunMode::Once => {
            let outcome = pipeline.run_once(&tickers, &shutdown.child_token()).await?;
            debug!("{}", outcome.report);

            if results_server.is_some() {
                info!("Serving results until Ctrl+C");
                shutdown.wait_for_shutdown().await;
            }
        }
        RunMode::Continuous => {
            let stats =
                run_continuous(&pipeline, &tickers, &config.run, &shutdown.child_token()).await;
            info!(
                completed = stats.completed,
                failed = stats.failed,
                "Scheduler stopped"
            );
        }
    }

    shutdown.shutdown();
    if let Some(handle) = results_server {
        match handle.await {
            Ok(Ok(())) => debug!("Results API stopped"),
            Ok(Err(e)) => error!("Results API failed: {}", e),
            Err(e) => error!("Results API task panicked: {}", e),
        }
    }

    info!("fairval stopped");
    Ok(())
}

fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Mode: {:?}", config.run.mode);
    println!("Tickers: {}", config.universe.tickers.len());
    println!("Adapters (priority): {}", config.adapters.priority.join(" > "));
    println!("Strategies: {}", config.strategies.enabled.join(", "));
    println!(
        "Consensus: {} (min_mos {:.2})",
        config.consensus.aggregation, config.consensus.min_mos
    );
    println!("Outputs: {}", config.outputs.modes.join(", "));

    Ok(())
}

fn init_command(output_path: PathBuf, force: bool) -> Result<()> {
    info!(?output_path, "Initializing new configuration file");

    if output_path.exists() && !force {
        anyhow::bail!(
            "{:?} already exists; pass --force to overwrite it",
            output_path
        );
    }

    let config = generate_default_config();
    save_config(&config, &output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("This configuration includes:");
    println!("  - {} tickers valued with the mock adapter", config.universe.tickers.len());
    println!("  - Strategies: {}", config.strategies.enabled.join(", "));
    println!("  - Outputs: {}", config.outputs.modes.join(", "));
    println!();
    println!("Next steps:");
    println!("  1. Edit the configuration file to customize settings");
    println!("  2. Add static sources or remote strategies as needed");
    println!(
        "  3. Run 'fairval validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  4. Run 'fairval run --config {:?}' to value the universe",
        output_path
    );

    Ok(())
}

fn registry_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = load_config(&config_path)?;

    let adapters = adapter_registry(&config.adapters).context("Failed to build adapters")?;
    let strategies = strategy_registry(&config.strategies, &config.scoring_service)
        .context("Failed to build strategies")?;

    println!("Adapters ({}):", adapters.len());
    for name in adapters.names() {
        let adapter = adapters.get(&name)?;
        let priority = config
            .adapters
            .priority
            .iter()
            .position(|p| *p == name)
            .map(|i| format!("priority {}", i + 1))
            .unwrap_or_else(|| "unused".to_string());
        let fields: Vec<String> = adapter.fields().into_iter().collect();
        println!("  {:<16} {:<12} fields: {}", name, priority, fields.join(", "));
    }

    println!();
    println!("Strategies ({}):", strategies.len());
    for name in strategies.names() {
        let strategy = strategies.get(&name)?;
        let enabled = if config.strategies.enabled.contains(&name) {
            "enabled"
        } else {
            "disabled"
        };
        let required: Vec<String> = strategy.required_fields().into_iter().collect();
        println!(
            "  {:<16} {:<20} {:<9} requires: {}",
            name,
            strategy.category(),
            enabled,
            required.join(", ")
        );
    }

    Ok(())
}
