//! CLI configuration
//!
//! Resolved from a TOML file, `BOND_RISK_*` environment variables and
//! command-line flags, in increasing order of precedence.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::OutputFormat;

const ENV_OUTPUT: &str = "BOND_RISK_OUTPUT";
const ENV_LOG_LEVEL: &str = "BOND_RISK_LOG_LEVEL";
const ENV_LADDER_STEP: &str = "BOND_RISK_LADDER_STEP";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid output format: {0}. Must be one of: json, table, csv, minimal")]
    InvalidOutput(String),

    #[error("Invalid ladder step: {0}. Must be a positive percentage")]
    InvalidLadderStep(String),

    #[error("Configuration file error: {0}")]
    FileError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn parse_output(s: &str) -> Result<OutputFormat, ConfigError> {
    match s.to_lowercase().as_str() {
        "json" => Ok(OutputFormat::Json),
        "table" => Ok(OutputFormat::Table),
        "csv" => Ok(OutputFormat::Csv),
        "minimal" => Ok(OutputFormat::Minimal),
        _ => Err(ConfigError::InvalidOutput(s.to_string())),
    }
}

fn parse_ladder_step(s: &str) -> Result<Decimal, ConfigError> {
    let step =
        Decimal::from_str(s.trim()).map_err(|_| ConfigError::InvalidLadderStep(s.to_string()))?;
    if step <= Decimal::ZERO {
        return Err(ConfigError::InvalidLadderStep(s.to_string()));
    }
    Ok(step)
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub log_level: LogLevel,
    pub output: OutputFormat,
    /// Default step of the shift ladder, in percent
    pub ladder_step_pct: Decimal,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Warn,
            output: OutputFormat::Json,
            ladder_step_pct: dec!(0.5),
        }
    }
}

impl CliConfig {
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileError(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let config: CliConfig = toml::from_str(&content).map_err(|e| {
            ConfigError::FileError(format!("Failed to parse '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply any `BOND_RISK_*` variables present in the environment.
    pub fn merge_env(&mut self) -> Result<(), ConfigError> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    fn merge_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(output) = var(ENV_OUTPUT) {
            self.output = parse_output(&output)?;
        }
        if let Some(level) = var(ENV_LOG_LEVEL) {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(step) = var(ENV_LADDER_STEP) {
            self.ladder_step_pct = parse_ladder_step(&step)?;
        }
        Ok(())
    }

    /// Command-line flags take precedence over every other source.
    pub fn merge_with_cli(&mut self, cli: &CliOverrides) -> Result<(), ConfigError> {
        if let Some(output) = &cli.output {
            self.output = output.clone();
        }
        if let Some(level) = &cli.log_level {
            self.log_level = LogLevel::from_str(level)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ladder_step_pct <= Decimal::ZERO {
            return Err(ConfigError::InvalidLadderStep(
                self.ladder_step_pct.to_string(),
            ));
        }
        Ok(())
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub output: Option<OutputFormat>,
    pub log_level: Option<String>,
}

/// Build configuration from all sources.
///
/// Priority (highest to lowest): CLI flags, environment, config file,
/// defaults.
pub fn build_config(cli: &CliOverrides) -> Result<CliConfig, ConfigError> {
    let mut config = match &cli.config_file {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::default(),
    };
    config.merge_env()?;
    config.merge_with_cli(cli)?;
    config.validate()?;
    Ok(config)
}
