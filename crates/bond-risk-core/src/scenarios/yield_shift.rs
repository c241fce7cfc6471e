use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::BondRiskError;
use crate::fixed_income::bond::BondRecord;
use crate::fixed_income::duration::{engine_assumptions, price_at_yield, RiskMetrics};
use crate::portfolio::aggregation::{evaluate_bonds, weight_positions, EvaluatedBonds, ExcludedBond};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Years};
use crate::BondRiskResult;

/// Largest parallel shift accepted in either direction (percent).
pub const MAX_SHIFT_PCT: Percent = dec!(5);
/// Granularity of the shift control (percent).
pub const SHIFT_STEP_PCT: Percent = dec!(0.1);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Per-bond row of a shifted scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioHolding {
    pub identifier: String,
    pub quantity: u32,
    /// Price as entered on the bond record
    pub quoted_price: Money,
    /// Re-discounted price at the unshifted yield
    pub base_model_price: Money,
    pub base_ytm_pct: Percent,
    pub shifted_ytm_pct: Percent,
    /// Re-discounted price at the shifted yield
    pub shifted_price: Money,
    /// shifted_price - base_model_price
    pub price_change: Money,
    /// price_change / base_model_price
    pub price_change_pct: Decimal,
    /// shifted_price x quantity
    pub market_value: Money,
    pub weight: Decimal,
    /// Base-case modified duration (not re-derived at the shifted yield)
    pub modified_duration: Years,
    /// Base-case convexity (not re-derived at the shifted yield)
    pub convexity: Decimal,
    pub duration_contribution: Decimal,
    pub convexity_contribution: Decimal,
}

/// Portfolio re-weighted on prices re-discounted under a parallel shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSnapshot {
    pub shift_pct: Percent,
    pub holdings: Vec<ScenarioHolding>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub excluded: Vec<ExcludedBond>,
    /// Quoted price x quantity, summed
    pub base_market_value: Money,
    /// Shifted price x quantity, summed
    pub total_market_value: Money,
    /// Base-case weighted modified duration (quoted-price weights)
    pub base_weighted_duration: Years,
    pub base_weighted_convexity: Decimal,
    /// Weighted modified duration using shifted-price weights
    pub weighted_duration: Years,
    pub weighted_convexity: Decimal,
}

/// One bond of the before/after price chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChangePoint {
    pub identifier: String,
    /// Quoted price
    pub price_before: Money,
    pub model_price_before: Money,
    pub price_after: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Apply a parallel shift of `shift_pct` (percent, additive to each bond's
/// own yield) and re-weight the portfolio on the re-discounted prices.
///
/// Prices are fully re-discounted at `ytm + shift` with the semi-annual
/// factor for every cash flow. Duration and convexity are carried over from
/// the base case unchanged, so after a large shift the aggregates mix new
/// weights with old sensitivities.
pub fn simulate_parallel_shift(
    bonds: &[BondRecord],
    shift_pct: Percent,
) -> BondRiskResult<ComputationOutput<ScenarioSnapshot>> {
    let start = Instant::now();
    validate_shift(shift_pct)?;

    let EvaluatedBonds {
        valued,
        mut excluded,
        mut warnings,
    } = evaluate_bonds(bonds);

    let mut repriced: Vec<(&BondRecord, &RiskMetrics, Money, Money)> = Vec::new();
    for (bond, metrics) in &valued {
        match reprice(bond, shift_pct) {
            Ok((base_model_price, shifted_price)) => {
                repriced.push((*bond, metrics, base_model_price, shifted_price));
            }
            Err(e) => {
                tracing::warn!(identifier = %bond.identifier, error = %e, "bond could not be re-priced");
                warnings.push(format!("{} excluded: {}", bond.identifier, e));
                excluded.push(ExcludedBond {
                    identifier: bond.identifier.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let base_positions: Vec<(Money, u32, &RiskMetrics)> = repriced
        .iter()
        .map(|(bond, metrics, _, _)| (bond.price, bond.quantity, *metrics))
        .collect();
    let (_, base_totals) = weight_positions(&base_positions)?;

    let shifted_positions: Vec<(Money, u32, &RiskMetrics)> = repriced
        .iter()
        .map(|(bond, metrics, _, shifted)| (*shifted, bond.quantity, *metrics))
        .collect();
    let (weighted, totals) = weight_positions(&shifted_positions)?;

    let holdings: Vec<ScenarioHolding> = repriced
        .iter()
        .zip(weighted)
        .map(|((bond, metrics, base_model_price, shifted_price), w)| {
            let price_change = *shifted_price - *base_model_price;
            ScenarioHolding {
                identifier: bond.identifier.clone(),
                quantity: bond.quantity,
                quoted_price: bond.price,
                base_model_price: *base_model_price,
                base_ytm_pct: bond.ytm_pct,
                shifted_ytm_pct: bond.ytm_pct + shift_pct,
                shifted_price: *shifted_price,
                price_change,
                price_change_pct: price_change / *base_model_price,
                market_value: w.market_value,
                weight: w.weight,
                modified_duration: metrics.modified_duration,
                convexity: metrics.convexity,
                duration_contribution: w.duration_contribution,
                convexity_contribution: w.convexity_contribution,
            }
        })
        .collect();

    tracing::info!(
        %shift_pct,
        holdings = holdings.len(),
        base_market_value = %base_totals.total_market_value,
        total_market_value = %totals.total_market_value,
        weighted_duration = %totals.weighted_duration,
        "parallel shift simulated"
    );

    let snapshot = ScenarioSnapshot {
        shift_pct,
        holdings,
        excluded,
        base_market_value: base_totals.total_market_value,
        total_market_value: totals.total_market_value,
        base_weighted_duration: base_totals.weighted_duration,
        base_weighted_convexity: base_totals.weighted_convexity,
        weighted_duration: totals.weighted_duration,
        weighted_convexity: totals.weighted_convexity,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Parallel Yield Shift (full re-pricing, base-case sensitivities)",
        &serde_json::json!({
            "shift_pct": shift_pct.to_string(),
            "repricing_discounting": "(1 + (y + shift)/2)^(2t) for every cash flow",
            "sensitivities": "modified duration and convexity held at base-case values",
            "engine": engine_assumptions(),
        }),
        warnings,
        elapsed,
        snapshot,
    ))
}

/// Before/after prices per bond, in holding order, ready for a bar chart.
pub fn price_change_series(snapshot: &ScenarioSnapshot) -> Vec<PriceChangePoint> {
    snapshot
        .holdings
        .iter()
        .map(|h| PriceChangePoint {
            identifier: h.identifier.clone(),
            price_before: h.quoted_price,
            model_price_before: h.base_model_price,
            price_after: h.shifted_price,
        })
        .collect()
}

/// Reject shifts outside [-MAX_SHIFT_PCT, +MAX_SHIFT_PCT].
pub fn validate_shift(shift_pct: Percent) -> BondRiskResult<()> {
    if shift_pct.abs() > MAX_SHIFT_PCT {
        return Err(BondRiskError::InvalidInput {
            field: "shift_pct".into(),
            reason: format!("Yield shift must be between -{MAX_SHIFT_PCT}% and +{MAX_SHIFT_PCT}%."),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// (price at own yield, price at shifted yield), both through the same path.
fn reprice(bond: &BondRecord, shift_pct: Percent) -> BondRiskResult<(Money, Money)> {
    let base = price_at_yield(bond, bond.ytm_pct)?;
    let shifted = price_at_yield(bond, bond.ytm_pct + shift_pct)?;
    if base.is_zero() {
        return Err(BondRiskError::DivisionByZero {
            context: format!("price change: base model price of '{}' is zero", bond.identifier),
        });
    }
    Ok((base, shifted))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
