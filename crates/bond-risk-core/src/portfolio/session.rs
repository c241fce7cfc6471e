use serde::{Deserialize, Serialize};

use crate::fixed_income::bond::BondRecord;
use crate::portfolio::aggregation::{analyze_portfolio, PortfolioSnapshot};
use crate::types::ComputationOutput;
use crate::BondRiskResult;

/// Ordered collection of validated bond records for one analysis session.
///
/// Records are only admitted through [`Portfolio::add_bond`], so every
/// record held here has passed the data entry checks. Insertion order is
/// preserved and carried through every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Portfolio {
    bonds: Vec<BondRecord>,
}

/// A record refused at the data entry boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// Zero-based position of the record in the submitted batch
    pub position: usize,
    pub identifier: String,
    pub reason: String,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a record.
    ///
    /// Returns the portfolio so that submissions can be chained with `?`.
    /// An invalid record leaves the portfolio unchanged.
    pub fn add_bond(&mut self, record: BondRecord) -> BondRiskResult<&mut Self> {
        record.validate()?;
        tracing::info!(
            identifier = %record.identifier,
            position = self.bonds.len(),
            "bond added to portfolio"
        );
        self.bonds.push(record);
        Ok(self)
    }

    /// Admit a batch of records, keeping every valid one and reporting the
    /// rest.
    pub fn from_records(
        records: impl IntoIterator<Item = BondRecord>,
    ) -> (Self, Vec<RejectedRecord>) {
        let mut portfolio = Self::new();
        let mut rejected = Vec::new();

        for (position, record) in records.into_iter().enumerate() {
            let identifier = record.identifier.clone();
            if let Err(e) = portfolio.add_bond(record) {
                tracing::warn!(%identifier, position, error = %e, "bond record rejected");
                rejected.push(RejectedRecord {
                    position,
                    identifier,
                    reason: e.to_string(),
                });
            }
        }

        (portfolio, rejected)
    }

    pub fn bonds(&self) -> &[BondRecord] {
        &self.bonds
    }

    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    /// Drop every record (session reset).
    pub fn clear(&mut self) {
        self.bonds.clear();
    }

    /// Market-value-weighted duration and convexity of the current holdings.
    pub fn analyze(&self) -> BondRiskResult<ComputationOutput<PortfolioSnapshot>> {
        analyze_portfolio(&self.bonds)
    }

    /// Re-price every holding under a parallel yield shift (in percent).
    #[cfg(feature = "scenarios")]
    pub fn simulate_shift(
        &self,
        shift_pct: crate::types::Percent,
    ) -> BondRiskResult<ComputationOutput<crate::scenarios::yield_shift::ScenarioSnapshot>> {
        crate::scenarios::yield_shift::simulate_parallel_shift(&self.bonds, shift_pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BondRiskError;
    use rust_decimal_macros::dec;

    fn bond(identifier: &str, quantity: u32) -> BondRecord {
        BondRecord {
            identifier: identifier.into(),
            maturity_years: 5,
            ytm_pct: dec!(5),
            coupon_rate_pct: dec!(5),
            price: dec!(100),
            face_value: dec!(1000),
            quantity,
        }
    }

    #[test]
    fn test_add_bond_preserves_insertion_order() {
        let mut portfolio = Portfolio::new();
        portfolio
            .add_bond(bond("A", 1))
            .unwrap()
            .add_bond(bond("B", 2))
            .unwrap()
            .add_bond(bond("C", 3))
            .unwrap();

        let ids: Vec<&str> = portfolio
            .bonds()
            .iter()
            .map(|b| b.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(portfolio.len(), 3);
    }

    #[test]
    fn test_invalid_bond_rejected_and_portfolio_unchanged() {
        let mut portfolio = Portfolio::new();
        portfolio.add_bond(bond("A", 1)).unwrap();

        let err = portfolio.add_bond(bond("bad", 0)).unwrap_err();
        assert!(matches!(err, BondRiskError::InvalidInput { .. }));
        assert_eq!(portfolio.len(), 1);
    }

    #[test]
    fn test_from_records_reports_rejections() {
        let mut too_long = bond("long", 1);
        too_long.maturity_years = 60;

        let (portfolio, rejected) =
            Portfolio::from_records(vec![bond("A", 1), too_long, bond("B", 1)]);

        assert_eq!(portfolio.len(), 2);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].position, 1);
        assert_eq!(rejected[0].identifier, "long");
        assert!(rejected[0].reason.contains("maturity_years"));
    }

    #[test]
    fn test_clear_resets_session() {
        let mut portfolio = Portfolio::new();
        portfolio.add_bond(bond("A", 1)).unwrap();
        portfolio.clear();
        assert!(portfolio.is_empty());
        assert!(matches!(
            portfolio.analyze(),
            Err(BondRiskError::EmptyPortfolio(_))
        ));
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut portfolio = Portfolio::new();
        portfolio.add_bond(bond("A", 1)).unwrap();
        let value = serde_json::to_value(&portfolio).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["identifier"], "A");
    }
}
