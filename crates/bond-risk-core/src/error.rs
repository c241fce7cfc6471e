use thiserror::Error;

#[derive(Debug, Error)]
pub enum BondRiskError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    /// Bond economics for which duration and convexity are undefined.
    #[error("Domain error: {field} — {reason}")]
    DomainError { field: String, reason: String },

    #[error("Empty portfolio: {0}")]
    EmptyPortfolio(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl BondRiskError {
    pub(crate) fn domain(field: &str, reason: impl Into<String>) -> Self {
        BondRiskError::DomainError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(field: &str) -> Self {
        Self::domain(field, "Value is too large to represent at 28 significant digits.")
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        BondRiskError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for BondRiskError {
    fn from(e: serde_json::Error) -> Self {
        BondRiskError::SerializationError(e.to_string())
    }
}
