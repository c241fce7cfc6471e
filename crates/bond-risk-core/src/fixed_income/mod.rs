pub mod bond;
pub mod cashflows;
pub mod duration;

pub use bond::{parse_bond_records, BondRecord};
pub use cashflows::{generate_cash_flows, CashFlow};
pub use duration::{
    calculate_risk_metrics, compute_risk_metrics, discounted_cash_flows, price_at_yield,
    DiscountedCashFlow, RiskMetrics,
};
