pub mod error;
pub mod types;

pub mod fixed_income;

#[cfg(feature = "portfolio")]
pub mod portfolio;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::BondRiskError;
pub use types::*;

/// Standard result type for all bond-risk operations
pub type BondRiskResult<T> = Result<T, BondRiskError>;
