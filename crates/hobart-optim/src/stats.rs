//! Portfolio performance statistics.

use crate::error::OptimError;
use crate::weights::WeightVector;
use hobart_risk::{CovarianceMatrix, ReturnVector};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Expected return, volatility and Sharpe ratio of a weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// `μᵀw`
    pub expected_annual_return: f64,
    /// `sqrt(wᵀSw)`
    pub annual_volatility: f64,
    /// `(μᵀw - r_f) / sqrt(wᵀSw)`, zero for a riskless portfolio
    pub sharpe_ratio: f64,
}

impl PerformanceStats {
    /// Statistics from raw arrays of matching length.
    pub fn compute(
        weights: &Array1<f64>,
        expected_returns: &Array1<f64>,
        covariance: &Array2<f64>,
        risk_free_rate: f64,
    ) -> Self {
        let expected_annual_return = weights.dot(expected_returns);
        let annual_volatility = weights.dot(&covariance.dot(weights)).max(0.0).sqrt();
        let sharpe_ratio = if annual_volatility > f64::EPSILON {
            (expected_annual_return - risk_free_rate) / annual_volatility
        } else {
            0.0
        };
        Self {
            expected_annual_return,
            annual_volatility,
            sharpe_ratio,
        }
    }

    /// Statistics of a labelled weight vector.
    ///
    /// # Errors
    /// Fails if the weights, returns and covariance are not labelled with the
    /// same tickers in the same order.
    pub fn of(
        weights: &WeightVector,
        expected_returns: &ReturnVector,
        covariance: &CovarianceMatrix,
        risk_free_rate: f64,
    ) -> Result<Self, OptimError> {
        covariance.ensure_same_tickers(expected_returns.tickers())?;
        covariance.ensure_same_tickers(weights.tickers())?;
        Ok(Self::compute(
            weights.values(),
            expected_returns.values(),
            covariance.values(),
            risk_free_rate,
        ))
    }
}
