use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::BondRiskError;
use crate::types::{Money, Percent};
use crate::BondRiskResult;

/// Longest maturity accepted at the data entry boundary (years).
pub const MAX_MATURITY_YEARS: u32 = 50;
/// Upper bound for yield-to-maturity and coupon rate entries (percent).
pub const MAX_RATE_PCT: Percent = dec!(20);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single fixed-rate bond position as entered by the user.
///
/// Rates are percentages (5 = 5%). The record is immutable once admitted
/// into a [`Portfolio`](crate::portfolio::session::Portfolio); every metric
/// is derived from it on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondRecord {
    /// Free-text name or identifier
    pub identifier: String,
    /// Whole years remaining until maturity
    pub maturity_years: u32,
    /// Annual yield to maturity, in percent
    pub ytm_pct: Percent,
    /// Annual coupon rate, in percent
    pub coupon_rate_pct: Percent,
    /// Quoted clean price
    pub price: Money,
    /// Face (par) value redeemed at maturity
    pub face_value: Money,
    /// Number of bonds held
    pub quantity: u32,
}

impl BondRecord {
    /// Market value of the position: price x quantity.
    pub fn market_value(&self) -> BondRiskResult<Money> {
        self.price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or_else(|| BondRiskError::overflow("market_value"))
    }

    /// Check the record against the data entry ranges.
    ///
    /// A record passing this check can still fail valuation: a price or
    /// face value of zero is admitted here but rejected by the engine with
    /// a domain error.
    pub fn validate(&self) -> BondRiskResult<()> {
        if self.maturity_years < 1 || self.maturity_years > MAX_MATURITY_YEARS {
            return Err(BondRiskError::invalid(
                "maturity_years",
                format!("Maturity must be between 1 and {MAX_MATURITY_YEARS} years."),
            ));
        }
        if self.ytm_pct < Decimal::ZERO || self.ytm_pct > MAX_RATE_PCT {
            return Err(BondRiskError::invalid(
                "ytm_pct",
                format!("Yield to maturity must be between 0% and {MAX_RATE_PCT}%."),
            ));
        }
        if self.coupon_rate_pct < Decimal::ZERO || self.coupon_rate_pct > MAX_RATE_PCT {
            return Err(BondRiskError::invalid(
                "coupon_rate_pct",
                format!("Coupon rate must be between 0% and {MAX_RATE_PCT}%."),
            ));
        }
        if self.price < Decimal::ZERO {
            return Err(BondRiskError::invalid(
                "price",
                "Price must be non-negative.",
            ));
        }
        if self.face_value < Decimal::ZERO {
            return Err(BondRiskError::invalid(
                "face_value",
                "Face value must be non-negative.",
            ));
        }
        if self.quantity < 1 {
            return Err(BondRiskError::invalid(
                "quantity",
                "Quantity must be at least 1.",
            ));
        }
        Ok(())
    }
}

/// Parse a JSON array of bond records.
///
/// Records are not validated here; admit them through
/// [`Portfolio::from_records`](crate::portfolio::session::Portfolio::from_records).
pub fn parse_bond_records(json: &str) -> BondRiskResult<Vec<BondRecord>> {
    Ok(serde_json::from_str(json)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
