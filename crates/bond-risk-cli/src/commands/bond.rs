use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use bond_risk_core::fixed_income::{calculate_risk_metrics, discounted_cash_flows, BondRecord};

use crate::input;

/// A single bond, from a JSON file, piped JSON, or flags
#[derive(Args)]
pub struct BondArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Bond name or identifier
    #[arg(long, default_value = "")]
    pub identifier: String,

    /// Maturity in whole years (1-50)
    #[arg(long)]
    pub maturity: Option<u32>,

    /// Yield to maturity in percent (0-20)
    #[arg(long)]
    pub ytm: Option<Decimal>,

    /// Annual coupon rate in percent (0-20)
    #[arg(long)]
    pub coupon: Option<Decimal>,

    /// Quoted price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Face value
    #[arg(long, default_value = "1000")]
    pub face_value: Decimal,

    /// Quantity held
    #[arg(long, default_value = "1")]
    pub quantity: u32,
}

impl BondArgs {
    fn from_flags(&self) -> Option<BondRecord> {
        Some(BondRecord {
            identifier: self.identifier.clone(),
            maturity_years: self.maturity?,
            ytm_pct: self.ytm?,
            coupon_rate_pct: self.coupon?,
            price: self.price?,
            face_value: self.face_value,
            quantity: self.quantity,
        })
    }
}

/// Resolve and validate the bond at the data entry boundary.
fn resolve_bond(args: &BondArgs) -> Result<BondRecord, Box<dyn std::error::Error>> {
    let bond: BondRecord = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(bond) = args.from_flags() {
        bond
    } else if let Some(bond) = input::stdin::read_stdin()? {
        bond
    } else {
        return Err(
            "--input <bond.json>, stdin, or --maturity/--ytm/--coupon/--price required".into(),
        );
    };
    bond.validate()?;
    Ok(bond)
}

pub fn run_metrics(args: BondArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bond = resolve_bond(&args)?;
    let result = calculate_risk_metrics(&bond)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_cashflows(args: BondArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bond = resolve_bond(&args)?;
    let schedule = discounted_cash_flows(&bond)?;
    Ok(serde_json::json!({
        "result": schedule,
        "methodology": "Annual cash flows discounted at (1 + y/2)^(2t)",
    }))
}
