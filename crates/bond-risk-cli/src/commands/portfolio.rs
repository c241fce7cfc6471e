use clap::Args;
use serde::Serialize;
use serde_json::Value;

use bond_risk_core::portfolio::{contribution_series, RejectedRecord};
use bond_risk_core::ComputationOutput;

use crate::input;

/// Arguments shared by the portfolio commands
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to a JSON array or CSV file of bond records
    #[arg(long)]
    pub input: Option<String>,
}

/// Prepend one warning per record refused at entry.
pub(crate) fn with_rejections<T: Serialize>(
    mut output: ComputationOutput<T>,
    rejected: &[RejectedRecord],
) -> ComputationOutput<T> {
    let mut warnings: Vec<String> = rejected
        .iter()
        .map(|r| format!("record {} ({}) rejected: {}", r.position, r.identifier, r.reason))
        .collect();
    warnings.append(&mut output.warnings);
    output.warnings = warnings;
    output
}

pub fn run_validate(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (portfolio, rejected) = input::load_portfolio(args.input.as_deref())?;
    Ok(serde_json::json!({
        "result": {
            "admitted": portfolio.len(),
            "rejected_count": rejected.len(),
        },
        "rejected": rejected,
        "bonds": portfolio,
    }))
}

pub fn run_portfolio(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (portfolio, rejected) = input::load_portfolio(args.input.as_deref())?;
    let result = portfolio.analyze()?;
    Ok(serde_json::to_value(with_rejections(result, &rejected))?)
}

pub fn run_contributions(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (portfolio, rejected) = input::load_portfolio(args.input.as_deref())?;
    let analysis = with_rejections(portfolio.analyze()?, &rejected);
    Ok(serde_json::json!({
        "result": contribution_series(&analysis.result),
        "methodology": "Contribution = weight x modified duration / weight x convexity",
        "warnings": analysis.warnings,
    }))
}
