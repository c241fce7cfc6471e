use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::BondRiskError;
use crate::fixed_income::bond::BondRecord;
use crate::fixed_income::duration::{
    compute_risk_metrics, engine_assumptions, price_divergence_warning, RiskMetrics,
};
use crate::types::{with_metadata, ComputationOutput, Money, Years};
use crate::BondRiskResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Per-bond row of a portfolio snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingAnalytics {
    pub identifier: String,
    pub quantity: u32,
    pub price: Money,
    /// price x quantity
    pub market_value: Money,
    /// market value / total market value
    pub weight: Decimal,
    pub macaulay_duration: Years,
    pub modified_duration: Years,
    pub convexity: Decimal,
    /// weight x modified duration
    pub duration_contribution: Decimal,
    /// weight x convexity
    pub convexity_contribution: Decimal,
}

/// A bond left out of the weighting because its metrics are undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedBond {
    pub identifier: String,
    pub reason: String,
}

/// Market-value-weighted view of the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub holdings: Vec<HoldingAnalytics>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub excluded: Vec<ExcludedBond>,
    pub total_market_value: Money,
    /// Sum of weight x modified duration
    pub weighted_duration: Years,
    /// Sum of weight x convexity
    pub weighted_convexity: Decimal,
}

/// One bar of the contribution chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionPoint {
    pub identifier: String,
    pub duration_contribution: Decimal,
    pub convexity_contribution: Decimal,
}

/// Weighting of one position, shared by the base case and shifted scenarios.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WeightedPosition {
    pub market_value: Money,
    pub weight: Decimal,
    pub duration_contribution: Decimal,
    pub convexity_contribution: Decimal,
}

/// Portfolio-level totals of a weighting pass.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WeightedTotals {
    pub total_market_value: Money,
    pub weighted_duration: Years,
    pub weighted_convexity: Decimal,
}

/// Bonds whose metrics could be computed, plus those that could not.
pub(crate) struct EvaluatedBonds<'a> {
    pub valued: Vec<(&'a BondRecord, RiskMetrics)>,
    pub excluded: Vec<ExcludedBond>,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute risk metrics for every bond independently, in order.
///
/// A failing bond yields an `Err` in its slot and does not affect the
/// others.
pub fn risk_metrics_by_bond(bonds: &[BondRecord]) -> Vec<BondRiskResult<RiskMetrics>> {
    bonds.iter().map(compute_risk_metrics).collect()
}

/// Aggregate per-bond modified duration and convexity into
/// market-value-weighted portfolio figures.
///
/// Bonds whose metrics are undefined (zero price, zero face value) are
/// listed under `excluded` and left out of the weighting. Fails with
/// [`BondRiskError::EmptyPortfolio`] when the remaining market value is zero.
pub fn analyze_portfolio(
    bonds: &[BondRecord],
) -> BondRiskResult<ComputationOutput<PortfolioSnapshot>> {
    let start = Instant::now();

    let EvaluatedBonds {
        valued,
        excluded,
        warnings,
    } = evaluate_bonds(bonds);

    let positions: Vec<(Money, u32, &RiskMetrics)> = valued
        .iter()
        .map(|(bond, metrics)| (bond.price, bond.quantity, metrics))
        .collect();
    let (weighted, totals) = weight_positions(&positions)?;

    let holdings: Vec<HoldingAnalytics> = valued
        .iter()
        .zip(weighted)
        .map(|((bond, metrics), w)| HoldingAnalytics {
            identifier: bond.identifier.clone(),
            quantity: bond.quantity,
            price: bond.price,
            market_value: w.market_value,
            weight: w.weight,
            macaulay_duration: metrics.macaulay_duration,
            modified_duration: metrics.modified_duration,
            convexity: metrics.convexity,
            duration_contribution: w.duration_contribution,
            convexity_contribution: w.convexity_contribution,
        })
        .collect();

    tracing::info!(
        holdings = holdings.len(),
        excluded = excluded.len(),
        total_market_value = %totals.total_market_value,
        weighted_duration = %totals.weighted_duration,
        weighted_convexity = %totals.weighted_convexity,
        "portfolio aggregated"
    );

    let snapshot = PortfolioSnapshot {
        holdings,
        excluded,
        total_market_value: totals.total_market_value,
        weighted_duration: totals.weighted_duration,
        weighted_convexity: totals.weighted_convexity,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Market-Value-Weighted Portfolio Duration & Convexity",
        &serde_json::json!({
            "market_value": "quoted price x quantity",
            "weighting": "market value / total market value",
            "aggregated_duration": "modified duration",
            "engine": engine_assumptions(),
        }),
        warnings,
        elapsed,
        snapshot,
    ))
}

/// Per-bond contributions, in holding order, ready for a bar chart.
pub fn contribution_series(snapshot: &PortfolioSnapshot) -> Vec<ContributionPoint> {
    snapshot
        .holdings
        .iter()
        .map(|h| ContributionPoint {
            identifier: h.identifier.clone(),
            duration_contribution: h.duration_contribution,
            convexity_contribution: h.convexity_contribution,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Run the engine on every bond, isolating failures.
pub(crate) fn evaluate_bonds(bonds: &[BondRecord]) -> EvaluatedBonds<'_> {
    let mut valued = Vec::with_capacity(bonds.len());
    let mut excluded = Vec::new();
    let mut warnings = Vec::new();

    for (bond, result) in bonds.iter().zip(risk_metrics_by_bond(bonds)) {
        // A position too large to value is treated like a failed bond
        let result = result.and_then(|metrics| bond.market_value().map(|_| metrics));
        match result {
            Ok(metrics) => {
                if let Some(w) = price_divergence_warning(bond, &metrics) {
                    warnings.push(w);
                }
                valued.push((bond, metrics));
            }
            Err(e) => {
                tracing::warn!(identifier = %bond.identifier, error = %e, "bond excluded from aggregation");
                warnings.push(format!("{} excluded: {}", bond.identifier, e));
                excluded.push(ExcludedBond {
                    identifier: bond.identifier.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    EvaluatedBonds {
        valued,
        excluded,
        warnings,
    }
}

/// Weight positions given as (price, quantity, metrics) by market value.
pub(crate) fn weight_positions(
    positions: &[(Money, u32, &RiskMetrics)],
) -> BondRiskResult<(Vec<WeightedPosition>, WeightedTotals)> {
    if positions.is_empty() {
        return Err(BondRiskError::EmptyPortfolio(
            "no bonds with computable risk metrics".into(),
        ));
    }

    let overflow = || BondRiskError::overflow("total_market_value");

    let market_values: Vec<Money> = positions
        .iter()
        .map(|(price, quantity, _)| {
            price
                .checked_mul(Decimal::from(*quantity))
                .ok_or_else(overflow)
        })
        .collect::<BondRiskResult<_>>()?;
    let total_market_value = market_values
        .iter()
        .try_fold(Decimal::ZERO, |acc, mv| acc.checked_add(*mv))
        .ok_or_else(overflow)?;

    if total_market_value.is_zero() {
        return Err(BondRiskError::EmptyPortfolio(
            "total market value is zero".into(),
        ));
    }

    let mut weighted_duration = Decimal::ZERO;
    let mut weighted_convexity = Decimal::ZERO;
    let mut weighted = Vec::with_capacity(positions.len());

    for ((_, _, metrics), market_value) in positions.iter().zip(market_values) {
        let weight = market_value / total_market_value;
        let duration_contribution = weight
            .checked_mul(metrics.modified_duration)
            .ok_or_else(|| BondRiskError::overflow("weighted_duration"))?;
        let convexity_contribution = weight
            .checked_mul(metrics.convexity)
            .ok_or_else(|| BondRiskError::overflow("weighted_convexity"))?;
        weighted_duration = weighted_duration
            .checked_add(duration_contribution)
            .ok_or_else(|| BondRiskError::overflow("weighted_duration"))?;
        weighted_convexity = weighted_convexity
            .checked_add(convexity_contribution)
            .ok_or_else(|| BondRiskError::overflow("weighted_convexity"))?;
        weighted.push(WeightedPosition {
            market_value,
            weight,
            duration_contribution,
            convexity_contribution,
        });
    }

    Ok((
        weighted,
        WeightedTotals {
            total_market_value,
            weighted_duration,
            weighted_convexity,
        },
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
