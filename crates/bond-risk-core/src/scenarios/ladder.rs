use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::BondRiskError;
use crate::fixed_income::bond::BondRecord;
use crate::scenarios::yield_shift::{
    simulate_parallel_shift, validate_shift, MAX_SHIFT_PCT, SHIFT_STEP_PCT,
};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Years};
use crate::BondRiskResult;

/// Most points a single ladder may hold; each one is a full re-pricing.
pub const MAX_LADDER_POINTS: usize = 1_001;

/// Range of parallel shifts to sweep, in percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftLadderInput {
    pub from_pct: Percent,
    pub to_pct: Percent,
    pub step_pct: Percent,
}

impl Default for ShiftLadderInput {
    fn default() -> Self {
        Self {
            from_pct: -MAX_SHIFT_PCT,
            to_pct: MAX_SHIFT_PCT,
            step_pct: SHIFT_STEP_PCT,
        }
    }
}

/// Portfolio totals at one shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderPoint {
    pub shift_pct: Percent,
    pub total_market_value: Money,
    /// total_market_value - base_model_market_value
    pub market_value_change: Money,
    pub market_value_change_pct: Decimal,
    pub weighted_duration: Years,
    pub weighted_convexity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftLadderOutput {
    /// Re-discounted value of the holdings at zero shift
    pub base_model_market_value: Money,
    pub points: Vec<LadderPoint>,
}

/// Re-price the portfolio at every shift from `from_pct` to `to_pct`.
///
/// The last point always lands on `to_pct`, even when the step does not
/// divide the range.
pub fn shift_ladder(
    bonds: &[BondRecord],
    input: &ShiftLadderInput,
) -> BondRiskResult<ComputationOutput<ShiftLadderOutput>> {
    let start = Instant::now();
    let shifts = generate_shifts(input)?;

    let base = simulate_parallel_shift(bonds, Decimal::ZERO)?;
    let warnings = base.warnings;
    let base_model_market_value = base.result.total_market_value;

    let mut points = Vec::with_capacity(shifts.len());
    for shift_pct in shifts {
        let snap = simulate_parallel_shift(bonds, shift_pct)?.result;
        let market_value_change = snap.total_market_value - base_model_market_value;
        points.push(LadderPoint {
            shift_pct,
            total_market_value: snap.total_market_value,
            market_value_change,
            market_value_change_pct: market_value_change / base_model_market_value,
            weighted_duration: snap.weighted_duration,
            weighted_convexity: snap.weighted_convexity,
        });
    }

    tracing::info!(points = points.len(), %base_model_market_value, "shift ladder built");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Parallel Yield Shift Ladder",
        &serde_json::json!({
            "from_pct": input.from_pct.to_string(),
            "to_pct": input.to_pct.to_string(),
            "step_pct": input.step_pct.to_string(),
            "change_reference": "re-discounted market value at zero shift",
        }),
        warnings,
        elapsed,
        ShiftLadderOutput {
            base_model_market_value,
            points,
        },
    ))
}

fn generate_shifts(input: &ShiftLadderInput) -> BondRiskResult<Vec<Percent>> {
    if input.step_pct <= Decimal::ZERO {
        return Err(BondRiskError::invalid("step_pct", "Step must be positive."));
    }
    if input.from_pct > input.to_pct {
        return Err(BondRiskError::invalid(
            "from_pct",
            "Start of the ladder must be <= its end.",
        ));
    }
    validate_shift(input.from_pct)?;
    validate_shift(input.to_pct)?;

    let min_step = SHIFT_STEP_PCT / Decimal::ONE_HUNDRED;
    if input.step_pct < min_step {
        return Err(BondRiskError::invalid(
            "step_pct",
            format!("Step must be at least {min_step}%."),
        ));
    }
    // Steps strictly inside the range, plus both endpoints
    let interior = ((input.to_pct - input.from_pct) / input.step_pct).ceil();
    if interior >= Decimal::from(MAX_LADDER_POINTS) {
        return Err(BondRiskError::invalid(
            "step_pct",
            format!("Ladder would exceed {MAX_LADDER_POINTS} points; use a larger step."),
        ));
    }

    let mut values = Vec::new();
    let mut current = input.from_pct;
    while current <= input.to_pct {
        values.push(current);
        current += input.step_pct;
    }
    if let Some(&last) = values.last() {
        if last < input.to_pct {
            values.push(input.to_pct);
        }
    }

    Ok(values)
}
