//! Asset covariance estimation
//!
//! Provides the covariance matrix of asset returns consumed by the
//! mean-variance optimizer and used for reporting portfolio volatility.

pub mod sample;

pub use sample::{SampleCovarianceConfig, SampleCovarianceEstimator};

use crate::correlation::correlation_from_covariance;
use crate::error::RiskError;
use crate::linalg::{cholesky, condition_number};
use hobart_data::{PriceMatrix, ReturnSeries};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Absolute tolerance for the symmetry check on construction.
const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// Trait for covariance matrix estimators
pub trait CovarianceEstimator {
    /// Estimate the covariance matrix from asset returns
    ///
    /// # Arguments
    /// * `returns` - Matrix where each row is a time period and each column is an asset
    ///
    /// # Returns
    /// * Estimated covariance matrix (N x N where N is number of assets)
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>, RiskError>;

    /// Estimate a labelled covariance matrix from a return series.
    fn estimate_series(&self, returns: &ReturnSeries) -> Result<CovarianceMatrix, RiskError> {
        let values = self.estimate(returns.values())?;
        CovarianceMatrix::new(returns.tickers().to_vec(), values)
    }

    /// Estimate a labelled covariance matrix straight from prices.
    fn estimate_prices(&self, prices: &PriceMatrix) -> Result<CovarianceMatrix, RiskError> {
        self.estimate_series(&prices.returns()?)
    }
}

/// Square, symmetric covariance matrix labelled by ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovarianceMatrix {
    tickers: Vec<String>,
    values: Array2<f64>,
}

impl CovarianceMatrix {
    /// Create a covariance matrix.
    ///
    /// # Errors
    /// Fails if the matrix is not square, does not match the labels, is not
    /// symmetric, or has a negative or non-finite variance.
    pub fn new(tickers: Vec<String>, values: Array2<f64>) -> Result<Self, RiskError> {
        let n = tickers.len();
        if values.nrows() != n {
            return Err(RiskError::DimensionMismatch {
                expected: n,
                actual: values.nrows(),
            });
        }
        if values.ncols() != n {
            return Err(RiskError::DimensionMismatch {
                expected: n,
                actual: values.ncols(),
            });
        }

        for i in 0..n {
            let var = values[[i, i]];
            if !var.is_finite() || var < 0.0 {
                return Err(RiskError::InvalidParameter(format!(
                    "variance of {} is {var}",
                    tickers[i]
                )));
            }
            for j in (i + 1)..n {
                let scale = 1.0_f64.max(values[[i, j]].abs());
                if (values[[i, j]] - values[[j, i]]).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(RiskError::InvalidParameter(format!(
                        "covariance is not symmetric at ({}, {})",
                        tickers[i], tickers[j]
                    )));
                }
            }
        }

        Ok(Self { tickers, values })
    }

    /// Asset tickers.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Raw matrix values.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    /// Whether there are no assets.
    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Diagonal of the matrix.
    pub fn variances(&self) -> Array1<f64> {
        self.values.diag().to_owned()
    }

    /// Square roots of the variances.
    pub fn volatilities(&self) -> Array1<f64> {
        self.values.diag().mapv(f64::sqrt)
    }

    /// Portfolio variance `w^T S w`.
    ///
    /// # Errors
    /// Fails when `weights` has the wrong length.
    pub fn portfolio_variance(&self, weights: &Array1<f64>) -> Result<f64, RiskError> {
        if weights.len() != self.len() {
            return Err(RiskError::DimensionMismatch {
                expected: self.len(),
                actual: weights.len(),
            });
        }
        Ok(weights.dot(&self.values.dot(weights)))
    }

    /// Pearson correlation matrix implied by this covariance.
    ///
    /// # Errors
    /// Fails if any asset has zero variance.
    pub fn correlation(&self) -> Result<Array2<f64>, RiskError> {
        correlation_from_covariance(&self.values, &self.tickers)
    }

    /// Whether the matrix admits a Cholesky factorization.
    pub fn is_positive_definite(&self) -> bool {
        cholesky(&self.values).is_ok()
    }

    /// Require strict positive definiteness.
    ///
    /// # Errors
    /// Returns [`RiskError::SingularCovariance`] describing the conditioning of
    /// the matrix when it is not positive definite.
    pub fn ensure_positive_definite(&self) -> Result<(), RiskError> {
        if self.is_empty() {
            return Err(RiskError::InsufficientData {
                what: "assets",
                required: 1,
                actual: 0,
            });
        }
        cholesky(&self.values).map(|_| ()).map_err(|_| {
            RiskError::SingularCovariance(format!(
                "{} assets, condition number {:.3e}; check for duplicate or collinear \
                 return series or too few observations",
                self.len(),
                condition_number(&self.values)
            ))
        })
    }

    /// Check that another input is labelled with the same tickers in the same order.
    ///
    /// # Errors
    /// Returns [`RiskError::TickerMismatch`] naming the first differing position.
    pub fn ensure_same_tickers(&self, tickers: &[String]) -> Result<(), RiskError> {
        if tickers.len() != self.len() {
            return Err(RiskError::DimensionMismatch {
                expected: self.len(),
                actual: tickers.len(),
            });
        }
        if let Some(pos) = tickers.iter().zip(&self.tickers).position(|(a, b)| a != b) {
            return Err(RiskError::TickerMismatch(format!(
                "position {pos}: {} vs {}",
                tickers[pos], self.tickers[pos]
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("A{i}")).collect()
    }

    #[test]
    fn test_rejects_asymmetric() {
        let values = Array2::from_shape_vec((2, 2), vec![1.0, 0.5, 0.2, 1.0]).unwrap();
        assert!(CovarianceMatrix::new(labels(2), values).is_err());
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let values = Array2::<f64>::eye(3);
        assert!(matches!(
            CovarianceMatrix::new(labels(2), values),
            Err(RiskError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_portfolio_variance() {
        let values = Array2::from_shape_vec((2, 2), vec![0.04, 0.01, 0.01, 0.09]).unwrap();
        let cov = CovarianceMatrix::new(labels(2), values).unwrap();
        let w = Array1::from(vec![0.5, 0.5]);
        // 0.25 * 0.04 + 0.25 * 0.09 + 2 * 0.25 * 0.01
        assert_relative_eq!(cov.portfolio_variance(&w).unwrap(), 0.0375, epsilon = 1e-12);
        assert_relative_eq!(cov.volatilities()[1], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_detected() {
        // Perfectly collinear assets
        let values = Array2::from_shape_vec((2, 2), vec![0.04, 0.04, 0.04, 0.04]).unwrap();
        let cov = CovarianceMatrix::new(labels(2), values).unwrap();
        assert!(!cov.is_positive_definite());
        assert!(matches!(
            cov.ensure_positive_definite(),
            Err(RiskError::SingularCovariance(_))
        ));
    }

    #[test]
    fn test_ticker_alignment() {
        let cov = CovarianceMatrix::new(labels(2), Array2::eye(2)).unwrap();
        assert!(cov.ensure_same_tickers(&labels(2)).is_ok());
        let swapped = vec!["A1".to_string(), "A0".to_string()];
        assert!(matches!(
            cov.ensure_same_tickers(&swapped),
            Err(RiskError::TickerMismatch(_))
        ));
    }
}
