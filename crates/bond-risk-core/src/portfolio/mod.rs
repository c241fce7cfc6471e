pub mod aggregation;
pub mod session;

pub use aggregation::{
    analyze_portfolio, contribution_series, risk_metrics_by_bond, ContributionPoint,
    ExcludedBond, HoldingAnalytics, PortfolioSnapshot,
};
pub use session::{Portfolio, RejectedRecord};
