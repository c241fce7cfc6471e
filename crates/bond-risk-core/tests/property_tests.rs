//! Property-based tests for the risk engine, aggregator and simulator.
//!
//! - Modified duration = Macaulay / (1 + y/2)
//! - Zero-coupon bonds at fair value have Macaulay duration = maturity
//! - Weights sum to one and weighted duration stays within holding range
//! - A zero shift reproduces base prices; larger shifts lower them

use bond_risk_core::fixed_income::{compute_risk_metrics, price_at_yield, BondRecord};
use bond_risk_core::portfolio::analyze_portfolio;
use bond_risk_core::scenarios::simulate_parallel_shift;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// GENERATORS
// =============================================================================

/// Percent with one decimal place in [0, max_tenths / 10].
fn pct(max_tenths: i64) -> impl Strategy<Value = Decimal> {
    (0..=max_tenths).prop_map(|tenths| Decimal::new(tenths, 1))
}

fn shift_pct() -> impl Strategy<Value = Decimal> {
    (-50i64..=50).prop_map(|tenths| Decimal::new(tenths, 1))
}

prop_compose! {
    fn arb_bond()(
        maturity_years in 1u32..=50,
        ytm_pct in pct(200),
        coupon_rate_pct in pct(200),
        price_cents in 1_000i64..=200_000,
        face in prop::sample::select(vec![100i64, 1000, 5000]),
        quantity in 1u32..=500,
    ) -> BondRecord {
        BondRecord {
            identifier: format!("B{maturity_years}-{price_cents}"),
            maturity_years,
            ytm_pct,
            coupon_rate_pct,
            price: Decimal::new(price_cents, 2),
            face_value: Decimal::from(face),
            quantity,
        }
    }
}

// =============================================================================
// ENGINE PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn modified_is_macaulay_over_semi_annual_factor(bond in arb_bond()) {
        let m = compute_risk_metrics(&bond).unwrap();
        let y = bond.ytm_pct / dec!(100);
        prop_assert_eq!(m.modified_duration, m.macaulay_duration / (Decimal::ONE + y / dec!(2)));
    }

    #[test]
    fn zero_coupon_at_fair_value_duration_is_maturity(
        maturity_years in 1u32..=50,
        ytm_pct in pct(200),
    ) {
        let mut bond = BondRecord {
            identifier: "Z".into(),
            maturity_years,
            ytm_pct,
            coupon_rate_pct: Decimal::ZERO,
            price: Decimal::ONE,
            face_value: dec!(1000),
            quantity: 1,
        };
        bond.price = price_at_yield(&bond, ytm_pct).unwrap();
        let m = compute_risk_metrics(&bond).unwrap();
        prop_assert!((m.macaulay_duration - Decimal::from(maturity_years)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn metrics_are_positive(bond in arb_bond()) {
        let m = compute_risk_metrics(&bond).unwrap();
        prop_assert!(m.macaulay_duration > Decimal::ZERO);
        prop_assert!(m.convexity > Decimal::ZERO);
        prop_assert!(m.model_price > Decimal::ZERO);
    }
}

// =============================================================================
// PORTFOLIO PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn weights_sum_to_one(bonds in prop::collection::vec(arb_bond(), 1..12)) {
        let snap = analyze_portfolio(&bonds).unwrap().result;
        let sum: Decimal = snap.holdings.iter().map(|h| h.weight).sum();
        prop_assert!((sum - Decimal::ONE).abs() < dec!(0.0000000001));
    }

    #[test]
    fn weighted_duration_is_convex_combination(bonds in prop::collection::vec(arb_bond(), 1..12)) {
        let snap = analyze_portfolio(&bonds).unwrap().result;
        let min = snap.holdings.iter().map(|h| h.modified_duration).min().unwrap();
        let max = snap.holdings.iter().map(|h| h.modified_duration).max().unwrap();
        let tol = dec!(0.000000001);
        prop_assert!(snap.weighted_duration >= min - tol);
        prop_assert!(snap.weighted_duration <= max + tol);
    }
}

// =============================================================================
// SCENARIO PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn zero_shift_reproduces_base_price(bonds in prop::collection::vec(arb_bond(), 1..8)) {
        let snap = simulate_parallel_shift(&bonds, Decimal::ZERO).unwrap().result;
        for h in &snap.holdings {
            prop_assert_eq!(h.shifted_price, h.base_model_price);
        }
    }

    #[test]
    fn higher_shift_lower_price(
        bond in arb_bond(),
        coupon in pct(200),
        a in shift_pct(),
        b in shift_pct(),
    ) {
        prop_assume!(a != b);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let bonds = vec![BondRecord {
            coupon_rate_pct: coupon.max(dec!(0.1)),
            ..bond
        }];
        let low = simulate_parallel_shift(&bonds, lo).unwrap().result;
        let high = simulate_parallel_shift(&bonds, hi).unwrap().result;
        prop_assert!(high.holdings[0].shifted_price < low.holdings[0].shifted_price);
    }
}
