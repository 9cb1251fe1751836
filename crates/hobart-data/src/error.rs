//! Error types for data operations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Coarse classification shared by every error type in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Too few observations or assets
    InsufficientData,
    /// Covariance is ill-conditioned or not positive definite
    SingularCovariance,
    /// No weight vector satisfies the constraints
    SolverInfeasible,
    /// Numerical failure inside the solver
    SolverDidNotConverge,
    /// Inputs share no dates
    DataAlignment,
    /// Malformed input or configuration
    InvalidInput,
}

impl ErrorKind {
    /// Stable snake_case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientData => "insufficient_data",
            Self::SingularCovariance => "singular_covariance",
            Self::SolverInfeasible => "solver_infeasible",
            Self::SolverDidNotConverge => "solver_did_not_converge",
            Self::DataAlignment => "data_alignment",
            Self::InvalidInput => "invalid_input",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while building or loading price data.
#[derive(Debug, Error)]
pub enum DataError {
    /// Too few rows or columns for the requested computation
    #[error("Insufficient data: need at least {required} {what}, got {actual}")]
    InsufficientData {
        /// What was being counted (rows, assets, ...)
        what: &'static str,
        /// Required count
        required: usize,
        /// Actual count
        actual: usize,
    },

    /// Dates are not strictly increasing
    #[error("Dates must be strictly increasing: {current} follows {previous}")]
    NonIncreasingDates {
        /// Earlier row's date
        previous: NaiveDate,
        /// Offending row's date
        current: NaiveDate,
    },

    /// A price is zero, negative, NaN or infinite
    #[error("Invalid price for {ticker} on {date}: {price}")]
    InvalidPrice {
        /// Ticker of the offending entry
        ticker: String,
        /// Date of the offending entry
        date: NaiveDate,
        /// The rejected value
        price: f64,
    },

    /// Missing data that cannot be filled
    #[error("Missing data for {ticker}: {reason}")]
    MissingData {
        /// Ticker that was queried
        ticker: String,
        /// Reason for missing data
        reason: String,
    },

    /// Ticker not present in the matrix
    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    /// Same ticker supplied more than once
    #[error("Duplicate ticker: {0}")]
    DuplicateTicker(String),

    /// Same date supplied more than once
    #[error("Duplicate date: {0}")]
    DuplicateDate(NaiveDate),

    /// Shape of supplied values disagrees with the labels
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected shape
        expected: String,
        /// Actual shape
        actual: String,
    },

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Classify the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientData { .. } => ErrorKind::InsufficientData,
            _ => ErrorKind::InvalidInput,
        }
    }

    /// Whether this error means there were too few observations or assets.
    pub const fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}
