use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use bond_risk_core::scenarios::{price_change_series, shift_ladder, ShiftLadderInput};

use super::portfolio::with_rejections;
use crate::config::CliConfig;
use crate::input;

/// Arguments for a single parallel shift
#[derive(Args)]
pub struct ShiftArgs {
    /// Path to a JSON array or CSV file of bond records
    #[arg(long)]
    pub input: Option<String>,

    /// Parallel yield shift in percent (-5.0 to 5.0)
    #[arg(long, allow_hyphen_values = true)]
    pub shift: Decimal,
}

/// Arguments for a sweep of parallel shifts
#[derive(Args)]
pub struct LadderArgs {
    /// Path to a JSON array or CSV file of bond records
    #[arg(long)]
    pub input: Option<String>,

    /// First shift in percent
    #[arg(long, default_value = "-5", allow_hyphen_values = true)]
    pub from: Decimal,

    /// Last shift in percent
    #[arg(long, default_value = "5", allow_hyphen_values = true)]
    pub to: Decimal,

    /// Step in percent (defaults to the configured ladder step)
    #[arg(long)]
    pub step: Option<Decimal>,
}

pub fn run_scenario(args: ShiftArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (portfolio, rejected) = input::load_portfolio(args.input.as_deref())?;
    let result = portfolio.simulate_shift(args.shift)?;
    Ok(serde_json::to_value(with_rejections(result, &rejected))?)
}

pub fn run_price_change(args: ShiftArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (portfolio, rejected) = input::load_portfolio(args.input.as_deref())?;
    let scenario = with_rejections(portfolio.simulate_shift(args.shift)?, &rejected);
    Ok(serde_json::json!({
        "result": price_change_series(&scenario.result),
        "methodology": format!("Price before/after a {}% parallel shift", args.shift),
        "warnings": scenario.warnings,
    }))
}

pub fn run_ladder(args: LadderArgs, config: &CliConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let (portfolio, rejected) = input::load_portfolio(args.input.as_deref())?;
    let ladder = ShiftLadderInput {
        from_pct: args.from,
        to_pct: args.to,
        step_pct: args.step.unwrap_or(config.ladder_step_pct),
    };
    let result = shift_ladder(portfolio.bonds(), &ladder)?;
    Ok(serde_json::to_value(with_rejections(result, &rejected))?)
}
