use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BondRiskError;
use crate::types::{Money, Rate};
use crate::BondRiskResult;

/// A single bond cash flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlow {
    /// Period index, counted in years from 1 to maturity
    pub period: u32,
    pub amount: Money,
}

/// Build the coupon and redemption schedule of a bullet bond.
///
/// One cash flow per year t = 1..=maturity: `coupon_rate * face_value` for
/// every period, with `face_value` added to the last one. `coupon_rate` is a
/// decimal (0.05 = 5%).
pub fn generate_cash_flows(
    maturity_years: u32,
    coupon_rate: Rate,
    face_value: Money,
) -> BondRiskResult<Vec<CashFlow>> {
    if maturity_years < 1 {
        return Err(BondRiskError::domain(
            "maturity_years",
            "Maturity must be at least one year; no cash flows can be generated.",
        ));
    }
    if face_value <= Decimal::ZERO {
        return Err(BondRiskError::domain(
            "face_value",
            "Face value must be positive.",
        ));
    }
    if coupon_rate < Decimal::ZERO {
        return Err(BondRiskError::invalid(
            "coupon_rate",
            "Coupon rate must be non-negative.",
        ));
    }

    let coupon = coupon_rate
        .checked_mul(face_value)
        .ok_or_else(|| BondRiskError::overflow("face_value"))?;
    let redemption = coupon
        .checked_add(face_value)
        .ok_or_else(|| BondRiskError::overflow("face_value"))?;

    let flows = (1..=maturity_years)
        .map(|period| CashFlow {
            period,
            amount: if period == maturity_years {
                redemption
            } else {
                coupon
            },
        })
        .collect();

    Ok(flows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_schedule_shape() {
        let flows = generate_cash_flows(3, dec!(0.05), dec!(1000)).unwrap();
        assert_eq!(
            flows,
            vec![
                CashFlow { period: 1, amount: dec!(50) },
                CashFlow { period: 2, amount: dec!(50) },
                CashFlow { period: 3, amount: dec!(1050) },
            ]
        );
    }

    #[test]
    fn test_single_period_bond() {
        let flows = generate_cash_flows(1, dec!(0.04), dec!(100)).unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].amount, dec!(104));
    }

    #[test]
    fn test_zero_coupon_only_redemption() {
        let flows = generate_cash_flows(4, Decimal::ZERO, dec!(1000)).unwrap();
        let total: Decimal = flows.iter().map(|cf| cf.amount).sum();
        assert_eq!(total, dec!(1000));
        assert_eq!(flows[3].amount, dec!(1000));
    }

    #[test]
    fn test_zero_maturity_is_domain_error() {
        let err = generate_cash_flows(0, dec!(0.05), dec!(1000)).unwrap_err();
        assert!(matches!(err, BondRiskError::DomainError { .. }));
    }

    #[test]
    fn test_unrepresentable_redemption_is_domain_error() {
        let err = generate_cash_flows(5, dec!(0.2), Decimal::MAX).unwrap_err();
        assert!(matches!(err, BondRiskError::DomainError { .. }));
    }

    #[test]
    fn test_non_positive_face_is_domain_error() {
        let err = generate_cash_flows(5, dec!(0.05), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, BondRiskError::DomainError { .. }));
    }
}
