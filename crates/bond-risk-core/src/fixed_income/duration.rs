use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::BondRiskError;
use crate::fixed_income::bond::BondRecord;
use crate::fixed_income::cashflows::{generate_cash_flows, CashFlow};
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Money, Percent, Rate, Years};
use crate::BondRiskResult;

/// Compounding periods per year used by every discount factor.
pub const COMPOUNDING_FREQUENCY: u32 = 2;

/// Relative gap between quoted and model price above which a warning is raised.
const PRICE_DIVERGENCE_THRESHOLD: Decimal = dec!(0.05);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Duration, convexity and price-consistency figures for one bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Sum of discounted cash flows at the stated yield
    pub model_price: Money,
    /// Quoted price / model price
    pub price_ratio: Decimal,
    /// Sum of t * PV(CF_t), normalised by the quoted price
    pub macaulay_duration: Years,
    /// Macaulay duration / (1 + y/2)
    pub modified_duration: Years,
    /// Second-order price sensitivity (years squared)
    pub convexity: Decimal,
}

/// A cash flow with its present value at the bond's own yield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountedCashFlow {
    pub period: u32,
    pub amount: Money,
    pub present_value: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute Macaulay duration, modified duration and convexity for a bond.
///
/// Cash flows are indexed in years (t = 1..M) and discounted with the
/// semi-annual factor `(1 + y/2)^(2t)`. Duration is normalised by the
/// *quoted* price, so a bond quoted per 100 against a 1000 face reports a
/// duration ten times its time-weighted maturity.
///
/// Convexity applies a further annual factor `(1 + y)^t` to the already
/// discounted cash flows and divides by `(1 + y)^2`. The two conventions
/// are not consistent with each other and are applied exactly as stated;
/// they are listed in the envelope assumptions.
pub fn compute_risk_metrics(bond: &BondRecord) -> BondRiskResult<RiskMetrics> {
    validate_economics(bond)?;

    let ytm = pct_to_rate(bond.ytm_pct);
    let coupon_rate = pct_to_rate(bond.coupon_rate_pct);
    let flows = generate_cash_flows(bond.maturity_years, coupon_rate, bond.face_value)?;
    let present_values = discount_cash_flows(&flows, ytm)?;

    let model_price = checked_sum(&present_values, "model_price")?;
    if model_price.is_zero() {
        return Err(BondRiskError::DivisionByZero {
            context: format!("price ratio: model price of '{}' is zero", bond.identifier),
        });
    }

    let macaulay_duration = compute_macaulay(&flows, &present_values, bond.price)?;
    let modified_duration =
        macaulay_duration / (Decimal::ONE + ytm / Decimal::from(COMPOUNDING_FREQUENCY));
    let convexity = compute_convexity(&flows, &present_values, ytm, bond.price)?;

    tracing::debug!(
        identifier = %bond.identifier,
        %macaulay_duration,
        %modified_duration,
        %convexity,
        "risk metrics computed"
    );

    let price_ratio = bond
        .price
        .checked_div(model_price)
        .ok_or_else(|| BondRiskError::overflow("price_ratio"))?;

    Ok(RiskMetrics {
        model_price,
        price_ratio,
        macaulay_duration,
        modified_duration,
        convexity,
    })
}

/// Compute risk metrics for a single bond and wrap them in the standard
/// output envelope, with the discounting conventions listed as assumptions.
pub fn calculate_risk_metrics(
    bond: &BondRecord,
) -> BondRiskResult<ComputationOutput<RiskMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let metrics = compute_risk_metrics(bond)?;
    if let Some(warning) = price_divergence_warning(bond, &metrics) {
        warnings.push(warning);
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Bond Duration & Convexity (quoted-price normalised)",
        &engine_assumptions(),
        warnings,
        elapsed,
        metrics,
    ))
}

/// Re-price a bond by discounting every cash flow at `ytm_pct` with the
/// semi-annual factor `(1 + y/2)^(2t)`.
///
/// Only the bond's static terms (maturity, coupon, face value) are used;
/// its quoted price is ignored.
pub fn price_at_yield(bond: &BondRecord, ytm_pct: Percent) -> BondRiskResult<Money> {
    if bond.maturity_years < 1 {
        return Err(BondRiskError::domain(
            "maturity_years",
            "Maturity must be at least one year.",
        ));
    }
    let flows = generate_cash_flows(
        bond.maturity_years,
        pct_to_rate(bond.coupon_rate_pct),
        bond.face_value,
    )?;
    let present_values = discount_cash_flows(&flows, pct_to_rate(ytm_pct))?;
    checked_sum(&present_values, "model_price")
}

/// The bond's cash-flow schedule with each flow discounted at its own yield.
///
/// The present values sum to [`RiskMetrics::model_price`].
pub fn discounted_cash_flows(bond: &BondRecord) -> BondRiskResult<Vec<DiscountedCashFlow>> {
    let flows = generate_cash_flows(
        bond.maturity_years,
        pct_to_rate(bond.coupon_rate_pct),
        bond.face_value,
    )?;
    let present_values = discount_cash_flows(&flows, pct_to_rate(bond.ytm_pct))?;
    Ok(flows
        .into_iter()
        .zip(present_values)
        .map(|(cf, present_value)| DiscountedCashFlow {
            period: cf.period,
            amount: cf.amount,
            present_value,
        })
        .collect())
}

/// Warning text when the quoted price is far from the model price.
pub(crate) fn price_divergence_warning(bond: &BondRecord, metrics: &RiskMetrics) -> Option<String> {
    let gap = (metrics.price_ratio - Decimal::ONE).abs();
    if gap > PRICE_DIVERGENCE_THRESHOLD {
        Some(format!(
            "{}: quoted price {} differs from model price {} by {}%; durations are normalised by the quoted price",
            bond.identifier,
            bond.price,
            metrics.model_price.round_dp(4),
            (gap * Decimal::ONE_HUNDRED).round_dp(2),
        ))
    } else {
        None
    }
}

/// The discounting conventions, reported with every engine-derived output.
pub(crate) fn engine_assumptions() -> serde_json::Value {
    serde_json::json!({
        "compounding_frequency": COMPOUNDING_FREQUENCY,
        "cash_flow_periods": "annual (t = 1..maturity)",
        "duration_discounting": "(1 + y/2)^(2t)",
        "duration_normalisation": "quoted price",
        "convexity_discounting": "PV at (1 + y/2)^(2t), further divided by (1 + y)^t and (1 + y)^2",
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_economics(bond: &BondRecord) -> BondRiskResult<()> {
    if bond.maturity_years < 1 {
        return Err(BondRiskError::domain(
            "maturity_years",
            "Maturity must be at least one year for duration to be defined.",
        ));
    }
    if bond.price <= Decimal::ZERO {
        return Err(BondRiskError::domain(
            "price",
            "Price must be positive for duration and convexity to be defined.",
        ));
    }
    if bond.face_value <= Decimal::ZERO {
        return Err(BondRiskError::domain(
            "face_value",
            "Face value must be positive.",
        ));
    }
    Ok(())
}

/// PV of each cash flow with df_t = df_{t-1} * (1 + y/2)^2 (iterative, no powd).
fn discount_cash_flows(flows: &[CashFlow], ytm: Rate) -> BondRiskResult<Vec<Money>> {
    let one_plus_y = Decimal::ONE + ytm / Decimal::from(COMPOUNDING_FREQUENCY);
    if one_plus_y <= Decimal::ZERO {
        return Err(BondRiskError::domain(
            "ytm",
            "Yield must be greater than -200% for semi-annual discounting.",
        ));
    }

    let mut df = Decimal::ONE;
    let mut last_period = 0;
    let mut present_values = Vec::with_capacity(flows.len());

    for cf in flows {
        for _ in last_period..cf.period {
            for _ in 0..COMPOUNDING_FREQUENCY {
                df = df
                    .checked_mul(one_plus_y)
                    .ok_or_else(|| BondRiskError::overflow("ytm"))?;
            }
        }
        last_period = cf.period;
        let pv = cf
            .amount
            .checked_div(df)
            .ok_or_else(|| BondRiskError::overflow("present_value"))?;
        present_values.push(pv);
    }

    Ok(present_values)
}

/// Sum with overflow reported against `field`.
fn checked_sum(values: &[Decimal], field: &str) -> BondRiskResult<Decimal> {
    values.iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(*v)
            .ok_or_else(|| BondRiskError::overflow(field))
    })
}

/// Sum of [t * PV(CF_t)] / quoted price.
fn compute_macaulay(
    flows: &[CashFlow],
    present_values: &[Money],
    price: Money,
) -> BondRiskResult<Years> {
    let mut weighted_sum = Decimal::ZERO;
    for (cf, pv) in flows.iter().zip(present_values) {
        weighted_sum = Decimal::from(cf.period)
            .checked_mul(*pv)
            .and_then(|term| weighted_sum.checked_add(term))
            .ok_or_else(|| BondRiskError::overflow("macaulay_duration"))?;
    }
    weighted_sum
        .checked_div(price)
        .ok_or_else(|| BondRiskError::overflow("macaulay_duration"))
}

/// (1 / Price) * sum[(t^2 + t) * PV(CF_t) / (1+y)^t] / (1+y)^2.
fn compute_convexity(
    flows: &[CashFlow],
    present_values: &[Money],
    ytm: Rate,
    price: Money,
) -> BondRiskResult<Decimal> {
    let one_plus_y = Decimal::ONE + ytm;
    if one_plus_y <= Decimal::ZERO {
        return Err(BondRiskError::domain(
            "ytm",
            "Yield must be greater than -100% for convexity.",
        ));
    }

    let mut numerator = Decimal::ZERO;
    let mut annual_df = Decimal::ONE;
    let mut last_period = 0;

    let overflow = || BondRiskError::overflow("convexity");

    for (cf, pv) in flows.iter().zip(present_values) {
        for _ in last_period..cf.period {
            annual_df = annual_df.checked_mul(one_plus_y).ok_or_else(overflow)?;
        }
        last_period = cf.period;
        let t = Decimal::from(cf.period);
        let term = (t * t + t)
            .checked_mul(*pv)
            .and_then(|v| v.checked_div(annual_df))
            .ok_or_else(overflow)?;
        numerator = numerator.checked_add(term).ok_or_else(overflow)?;
    }

    numerator
        .checked_div(price)
        .and_then(|v| v.checked_div(one_plus_y * one_plus_y))
        .ok_or_else(overflow)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tolerance,
            "{}: expected ~{}, got {} (diff = {}, tolerance = {})",
            msg,
            expected,
            actual,
            diff,
            tolerance
        );
    }

    /// 5-year 5% annual-coupon bond on a 1000 face, quoted at par.
    fn par_bond() -> BondRecord {
        BondRecord {
            identifier: "5Y 5%".into(),
            maturity_years: 5,
            ytm_pct: dec!(5),
            coupon_rate_pct: dec!(5),
            price: dec!(1000),
            face_value: dec!(1000),
            quantity: 1,
        }
    }

    #[test]
    fn test_golden_values_quoted_at_face() {
        let m = compute_risk_metrics(&par_bond()).unwrap();
        assert_close(m.model_price, dec!(997.2987457003), dec!(0.000001), "Model price");
        assert_close(m.macaulay_duration, dec!(4.5329712374), dec!(0.000001), "Macaulay");
        assert_close(m.modified_duration, dec!(4.4224109633), dec!(0.000001), "Modified");
        assert_close(m.convexity, dec!(18.8119209359), dec!(0.000001), "Convexity");
    }

    #[test]
    fn test_golden_values_quoted_per_hundred() {
        let bond = BondRecord {
            price: dec!(100),
            ..par_bond()
        };
        let m = compute_risk_metrics(&bond).unwrap();
        assert_close(m.macaulay_duration, dec!(45.329712374), dec!(0.00001), "Macaulay");
        assert_close(m.modified_duration, dec!(44.224109633), dec!(0.00001), "Modified");
        assert_close(m.convexity, dec!(188.119209359), dec!(0.00001), "Convexity");
        assert_close(m.price_ratio, dec!(0.1002709), dec!(0.0000001), "Price ratio");
    }

    #[test]
    fn test_zero_coupon_at_fair_value_duration_equals_maturity() {
        let mut bond = BondRecord {
            identifier: "Zero 7Y".into(),
            maturity_years: 7,
            ytm_pct: dec!(4),
            coupon_rate_pct: Decimal::ZERO,
            price: dec!(1),
            face_value: dec!(1000),
            quantity: 1,
        };
        bond.price = price_at_yield(&bond, bond.ytm_pct).unwrap();

        let m = compute_risk_metrics(&bond).unwrap();
        assert_close(
            m.macaulay_duration,
            dec!(7),
            dec!(0.000000000001),
            "Zero-coupon Macaulay duration should equal maturity",
        );
        assert_close(m.price_ratio, Decimal::ONE, dec!(0.000000000001), "Fair price ratio");
    }

    #[test]
    fn test_modified_duration_relationship_is_exact() {
        for ytm_pct in [dec!(0), dec!(2.5), dec!(7), dec!(19.9)] {
            let bond = BondRecord {
                ytm_pct,
                ..par_bond()
            };
            let m = compute_risk_metrics(&bond).unwrap();
            let y = ytm_pct / dec!(100);
            assert_eq!(
                m.modified_duration,
                m.macaulay_duration / (Decimal::ONE + y / dec!(2)),
                "Modified = Macaulay / (1 + y/2) at ytm {}%",
                ytm_pct
            );
        }
    }

    #[test]
    fn test_zero_yield_undiscounted() {
        let bond = BondRecord {
            ytm_pct: Decimal::ZERO,
            coupon_rate_pct: Decimal::ZERO,
            ..par_bond()
        };
        let m = compute_risk_metrics(&bond).unwrap();
        assert_eq!(m.model_price, dec!(1000));
        assert_eq!(m.macaulay_duration, dec!(5));
        assert_eq!(m.modified_duration, dec!(5));
        // (5^2 + 5) * 1000 / 1000
        assert_eq!(m.convexity, dec!(30));
    }

    #[test]
    fn test_duration_scales_inversely_with_quoted_price() {
        let at_face = compute_risk_metrics(&par_bond()).unwrap();
        let half = compute_risk_metrics(&BondRecord {
            price: dec!(500),
            ..par_bond()
        })
        .unwrap();
        assert_close(
            half.macaulay_duration,
            at_face.macaulay_duration * dec!(2),
            dec!(0.0000000001),
            "Halving the quoted price doubles the duration",
        );
        assert_eq!(half.model_price, at_face.model_price);
    }

    #[test]
    fn test_higher_coupon_lower_duration() {
        let low = compute_risk_metrics(&par_bond()).unwrap();
        let high = compute_risk_metrics(&BondRecord {
            coupon_rate_pct: dec!(9),
            price: dec!(1150),
            ..par_bond()
        })
        .unwrap();
        // Undo the quoted-price normalisation to compare time-weighted averages
        let low_avg = low.macaulay_duration * dec!(1000) / low.model_price;
        let high_avg = high.macaulay_duration * dec!(1150) / high.model_price;
        assert!(
            high_avg < low_avg,
            "Higher coupon ({}) should shorten average life vs lower coupon ({})",
            high_avg,
            low_avg
        );
    }

    #[test]
    fn test_convexity_positive() {
        let m = compute_risk_metrics(&par_bond()).unwrap();
        assert!(m.convexity > Decimal::ZERO);
    }

    #[test]
    fn test_zero_maturity_domain_error() {
        let bond = BondRecord {
            maturity_years: 0,
            ..par_bond()
        };
        match compute_risk_metrics(&bond).unwrap_err() {
            BondRiskError::DomainError { field, .. } => assert_eq!(field, "maturity_years"),
            other => panic!("Expected DomainError, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_price_domain_error() {
        let bond = BondRecord {
            price: Decimal::ZERO,
            ..par_bond()
        };
        match compute_risk_metrics(&bond).unwrap_err() {
            BondRiskError::DomainError { field, .. } => assert_eq!(field, "price"),
            other => panic!("Expected DomainError, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_face_domain_error() {
        let bond = BondRecord {
            face_value: Decimal::ZERO,
            ..par_bond()
        };
        assert!(matches!(
            compute_risk_metrics(&bond),
            Err(BondRiskError::DomainError { .. })
        ));
    }

    #[test]
    fn test_overflowing_face_value_domain_error() {
        // Admitted at entry, but the time-weighted sum exceeds Decimal range
        let bond = BondRecord {
            maturity_years: 50,
            ytm_pct: dec!(20),
            coupon_rate_pct: dec!(20),
            face_value: Decimal::MAX / dec!(2),
            ..par_bond()
        };
        assert!(bond.validate().is_ok());
        match compute_risk_metrics(&bond).unwrap_err() {
            BondRiskError::DomainError { field, .. } => assert_eq!(field, "macaulay_duration"),
            other => panic!("Expected DomainError, got {other:?}"),
        }
    }

    #[test]
    fn test_price_at_own_yield_matches_model_price() {
        let bond = par_bond();
        let m = compute_risk_metrics(&bond).unwrap();
        assert_eq!(price_at_yield(&bond, bond.ytm_pct).unwrap(), m.model_price);
    }

    #[test]
    fn test_discounted_schedule_sums_to_model_price() {
        let bond = par_bond();
        let schedule = discounted_cash_flows(&bond).unwrap();
        assert_eq!(schedule.len(), 5);
        assert_eq!(schedule[4].amount, dec!(1050));
        assert!(schedule[0].present_value < schedule[0].amount);

        let total: Money = schedule.iter().map(|cf| cf.present_value).sum();
        assert_eq!(total, compute_risk_metrics(&bond).unwrap().model_price);
    }

    #[test]
    fn test_price_at_yield_ignores_quoted_price() {
        let quoted_low = BondRecord {
            price: dec!(1),
            ..par_bond()
        };
        assert_eq!(
            price_at_yield(&quoted_low, dec!(6)).unwrap(),
            price_at_yield(&par_bond(), dec!(6)).unwrap()
        );
    }

    #[test]
    fn test_price_at_yield_inverse_relationship() {
        let bond = par_bond();
        let lower = price_at_yield(&bond, dec!(4)).unwrap();
        let higher = price_at_yield(&bond, dec!(6)).unwrap();
        assert!(lower > higher);
    }

    #[test]
    fn test_envelope_warns_on_price_divergence() {
        let per_hundred = BondRecord {
            price: dec!(100),
            ..par_bond()
        };
        let out = calculate_risk_metrics(&per_hundred).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("model price"));

        let at_face = calculate_risk_metrics(&par_bond()).unwrap();
        assert!(at_face.warnings.is_empty());
        assert_eq!(at_face.assumptions["compounding_frequency"], 2);
    }
}
