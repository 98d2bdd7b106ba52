use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/fairval.yaml";

#[derive(Parser, Debug)]
#[command(name = "fairval")]
#[command(about = "fairval - multi-source, multi-strategy fair value estimation")]
#[command(version)]
pub struct Cli {
    /// Log output format (overrides logging.format in the config)
    #[arg(long, global = true, value_enum, env = "FAIRVAL_LOG_FORMAT")]
    pub log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the valuation pipeline
    Run {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Run a single pass, even if the config asks for continuous mode
        #[arg(long)]
        once: bool,

        /// Comma-separated tickers replacing universe.tickers
        #[arg(short, long, value_delimiter = ',')]
        tickers: Vec<String>,

        /// Override consensus.min_mos
        #[arg(long)]
        min_mos: Option<f64>,

        /// Override consensus.aggregation
        #[arg(long, value_enum)]
        aggregation: Option<AggregationArg>,

        /// Comma-separated output modes replacing outputs.modes
        #[arg(short, long, value_delimiter = ',')]
        output: Vec<String>,
    },

    /// Validate configuration without running
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Write a configuration file with every default filled in
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "fairval.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List the adapters and strategies a configuration registers
    Registry {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
    Compact,
}

impl LogFormatArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormatArg::Pretty => "pretty",
            LogFormatArg::Json => "json",
            LogFormatArg::Compact => "compact",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregationArg {
    WeightedAverage,
    Median,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["fairval", "run"]).unwrap();
        match cli.command {
            Commands::Run {
                config,
                once,
                tickers,
                min_mos,
                aggregation,
                output,
            } => {
                assert_eq!(config, PathBuf::from(DEFAULT_CONFIG_PATH));
                assert!(!once);
                assert!(tickers.is_empty());
                assert!(min_mos.is_none());
                assert!(aggregation.is_none());
                assert!(output.is_empty());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "fairval",
            "--log-format",
            "json",
            "run",
            "--once",
            "-t",
            "aapl,msft",
            "--min-mos",
            "0.3",
            "--aggregation",
            "median",
            "-o",
            "console,json",
        ])
        .unwrap();

        assert_eq!(cli.log_format, Some(LogFormatArg::Json));
        match cli.command {
            Commands::Run {
                once,
                tickers,
                min_mos,
                aggregation,
                output,
                ..
            } => {
                assert!(once);
                assert_eq!(tickers, vec!["aapl", "msft"]);
                assert_eq!(min_mos, Some(0.3));
                assert_eq!(aggregation, Some(AggregationArg::Median));
                assert_eq!(output, vec!["console", "json"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_other_commands() {
        let cli = Cli::try_parse_from(["fairval", "init", "-o", "x.yaml", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { force: true, .. }));

        let cli = Cli::try_parse_from(["fairval", "registry"]).unwrap();
        assert!(matches!(cli.command, Commands::Registry { .. }));

        assert!(Cli::try_parse_from(["fairval", "start"]).is_err());
    }
}
