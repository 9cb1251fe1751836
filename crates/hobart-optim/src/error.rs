//! Error types for the optimizers.

use hobart_data::ErrorKind;
use hobart_risk::RiskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by a [`ConvexQpSolver`](crate::qp::ConvexQpSolver).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SolverError {
    /// No point satisfies all constraints
    #[error("Problem is infeasible: {0}")]
    Infeasible(String),

    /// Iteration cap reached or numerical breakdown
    #[error("Solver did not converge after {iterations} iterations: {reason}")]
    DidNotConverge {
        /// Iterations performed
        iterations: usize,
        /// What went wrong
        reason: String,
    },

    /// Quadratic term is not positive definite
    #[error("Objective is not strictly convex: {0}")]
    NotPositiveDefinite(String),

    /// Problem data has inconsistent sizes
    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Offending component
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },
}

impl SolverError {
    /// Classify the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Infeasible(_) => ErrorKind::SolverInfeasible,
            Self::DidNotConverge { .. } => ErrorKind::SolverDidNotConverge,
            Self::NotPositiveDefinite(_) => ErrorKind::SingularCovariance,
            Self::DimensionMismatch { .. } => ErrorKind::InvalidInput,
        }
    }
}

/// The optimization that was being run when a solver error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMode {
    /// Maximum Sharpe ratio
    MaxSharpe,
    /// Global minimum volatility
    MinVolatility,
    /// Minimum volatility at a fixed target return
    TargetReturn,
    /// Hierarchical risk parity
    Hrp,
}

impl fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MaxSharpe => "max_sharpe",
            Self::MinVolatility => "min_volatility",
            Self::TargetReturn => "target_return",
            Self::Hrp => "hrp",
        };
        f.write_str(name)
    }
}

/// Errors raised by the optimizers.
#[derive(Debug, Error)]
pub enum OptimError {
    /// Solver failure, tagged with the optimization that triggered it
    #[error("{mode} optimization failed: {source}")]
    Solver {
        /// Optimization being run
        mode: OptimizationMode,
        /// Underlying solver error
        #[source]
        source: SolverError,
    },

    /// Bounds admit no fully invested portfolio
    #[error("Infeasible weight bounds: {0}")]
    InfeasibleBounds(String),

    /// No asset earns more than the risk-free rate
    #[error(
        "at least one asset must have an expected return exceeding the risk-free rate \
         ({risk_free_rate:.4}); the highest is {max_return:.4}"
    )]
    NoExcessReturn {
        /// Risk-free rate used
        risk_free_rate: f64,
        /// Highest expected return across assets
        max_return: f64,
    },

    /// Every frontier target was infeasible
    #[error("No feasible efficient frontier points out of {requested} requested")]
    NoFeasibleFrontierPoints {
        /// Number of targets tried
        requested: usize,
    },

    /// Too few assets or observations
    #[error("Insufficient data: need at least {required} {what}, got {actual}")]
    InsufficientData {
        /// What was being counted
        what: &'static str,
        /// Required count
        required: usize,
        /// Actual count
        actual: usize,
    },

    /// Inputs disagree in length or labelling
    #[error("Mismatched inputs: {0}")]
    Mismatch(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Estimation error
    #[error(transparent)]
    Risk(#[from] RiskError),
}

impl OptimError {
    /// Tag a solver error with the failing optimization.
    pub const fn solver(mode: OptimizationMode, source: SolverError) -> Self {
        Self::Solver { mode, source }
    }

    /// Classify the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Solver { source, .. } => source.kind(),
            Self::InfeasibleBounds(_) | Self::NoExcessReturn { .. } => {
                ErrorKind::SolverInfeasible
            }
            Self::NoFeasibleFrontierPoints { .. } => ErrorKind::SolverInfeasible,
            Self::InsufficientData { .. } => ErrorKind::InsufficientData,
            Self::Mismatch(_) | Self::InvalidParameter(_) => ErrorKind::InvalidInput,
            Self::Risk(err) => err.kind(),
        }
    }

    /// Whether this error is a solver infeasibility.
    pub const fn is_infeasible(&self) -> bool {
        matches!(
            self,
            Self::Solver {
                source: SolverError::Infeasible(_),
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_error_tagged_with_mode() {
        let err = OptimError::solver(
            OptimizationMode::TargetReturn,
            SolverError::Infeasible("target above ceiling".into()),
        );
        assert!(err.is_infeasible());
        assert_eq!(err.kind(), ErrorKind::SolverInfeasible);
        assert!(err.to_string().starts_with("target_return optimization failed"));
    }

    #[test]
    fn test_kind_passes_through_risk_errors() {
        let err = OptimError::from(RiskError::SingularCovariance("rank 1".into()));
        assert_eq!(err.kind(), ErrorKind::SingularCovariance);
    }
}
