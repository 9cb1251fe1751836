//! Error types for return and covariance estimation.

use hobart_data::{DataError, ErrorKind};
use thiserror::Error;

/// Errors that can occur during estimation
#[derive(Debug, Error)]
pub enum RiskError {
    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} {what}, got {actual}")]
    InsufficientData {
        /// What was being counted
        what: &'static str,
        /// Required count
        required: usize,
        /// Actual count
        actual: usize,
    },

    /// Matrix is not positive definite
    #[error("Covariance matrix is singular or not positive definite: {0}")]
    SingularCovariance(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Ticker labels of two inputs disagree
    #[error("Ticker mismatch: {0}")]
    TickerMismatch(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Underlying data error
    #[error(transparent)]
    Data(#[from] DataError),
}

impl RiskError {
    /// Classify the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientData { .. } => ErrorKind::InsufficientData,
            Self::SingularCovariance(_) => ErrorKind::SingularCovariance,
            Self::Data(err) => err.kind(),
            _ => ErrorKind::InvalidInput,
        }
    }

    /// Whether this error means there were too few observations or assets.
    pub const fn is_insufficient_data(&self) -> bool {
        match self {
            Self::InsufficientData { .. } => true,
            Self::Data(err) => err.is_insufficient_data(),
            _ => false,
        }
    }
}
