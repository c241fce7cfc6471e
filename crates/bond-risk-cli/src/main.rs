mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Deserialize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::bond::BondArgs;
use commands::portfolio::PortfolioArgs;
use commands::scenario::{LadderArgs, ShiftArgs};
use config::{CliConfig, CliOverrides};

/// Duration, convexity and yield-shift analytics for bond portfolios
#[derive(Parser)]
#[command(
    name = "bond-risk",
    version,
    about = "Duration, convexity and yield-shift analytics for bond portfolios",
    long_about = "A CLI for measuring the interest-rate risk of fixed-coupon bonds \
                  with decimal precision. Computes Macaulay and modified duration, \
                  convexity, value-weighted portfolio figures and the effect of \
                  parallel yield shifts."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (overrides config and BOND_RISK_OUTPUT)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,

    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "BOND_RISK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Risk metrics of a single bond
    Metrics(BondArgs),
    /// Discounted cash flow schedule of a single bond
    Cashflows(BondArgs),
    /// Check bond records at data entry without analysing them
    Validate(PortfolioArgs),
    /// Value-weighted portfolio duration and convexity
    Portfolio(PortfolioArgs),
    /// Per-bond contributions to portfolio duration and convexity
    Contributions(PortfolioArgs),
    /// Re-price the portfolio under a parallel yield shift
    Scenario(ShiftArgs),
    /// Per-bond price before and after a parallel yield shift
    PriceChange(ShiftArgs),
    /// Portfolio market value across a range of parallel shifts
    Ladder(LadderArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
    Csv,
    Minimal,
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins
/// over the configured level.
fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        config_file: cli.config.clone(),
        output: cli.output.clone(),
        log_level: cli.log_level.clone(),
    };
    let config = match config::build_config(&overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(2);
        }
    };
    init_tracing(&config);
    tracing::debug!(?config, "configuration resolved");

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Metrics(args) => commands::bond::run_metrics(args),
        Commands::Cashflows(args) => commands::bond::run_cashflows(args),
        Commands::Validate(args) => commands::portfolio::run_validate(args),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args),
        Commands::Contributions(args) => commands::portfolio::run_contributions(args),
        Commands::Scenario(args) => commands::scenario::run_scenario(args),
        Commands::PriceChange(args) => commands::scenario::run_price_change(args),
        Commands::Ladder(args) => commands::scenario::run_ladder(args, &config),
        Commands::Version => {
            println!("bond-risk {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&config.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
