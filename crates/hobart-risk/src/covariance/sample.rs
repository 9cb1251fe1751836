//! Sample Covariance Estimator
//!
//! The unbiased sample covariance of simple returns, annualized:
//!
//! S = frequency / (T - ddof) * (R - mean(R))^T (R - mean(R))
//!
//! where R is the T x N return matrix.

use super::CovarianceEstimator;
use crate::error::RiskError;
use crate::returns::TRADING_DAYS_PER_YEAR;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Sample covariance estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleCovarianceConfig {
    /// Periods per year used for annualization (default: 252)
    pub frequency: usize,

    /// Delta degrees of freedom (default: 1)
    pub ddof: usize,
}

impl Default for SampleCovarianceConfig {
    fn default() -> Self {
        Self {
            frequency: TRADING_DAYS_PER_YEAR,
            ddof: 1,
        }
    }
}

/// Annualized sample covariance estimator
#[derive(Debug, Clone, Default)]
pub struct SampleCovarianceEstimator {
    config: SampleCovarianceConfig,
}

impl SampleCovarianceEstimator {
    /// Create a new sample covariance estimator
    ///
    /// # Errors
    /// Returns an error if the frequency is zero.
    pub fn new(config: SampleCovarianceConfig) -> Result<Self, RiskError> {
        if config.frequency == 0 {
            return Err(RiskError::InvalidParameter(
                "frequency must be positive".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Estimator configuration
    pub const fn config(&self) -> &SampleCovarianceConfig {
        &self.config
    }

    /// Minimum number of return observations needed.
    pub const fn min_observations(&self) -> usize {
        self.config.ddof + 1
    }
}

impl CovarianceEstimator for SampleCovarianceEstimator {
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>, RiskError> {
        let (n_periods, n_assets) = returns.dim();

        if n_periods < self.min_observations() {
            return Err(RiskError::InsufficientData {
                what: "return observations",
                required: self.min_observations(),
                actual: n_periods,
            });
        }
        if n_assets == 0 {
            return Err(RiskError::InsufficientData {
                what: "assets",
                required: 1,
                actual: 0,
            });
        }

        let means = returns
            .mean_axis(Axis(0))
            .ok_or(RiskError::InsufficientData {
                what: "return observations",
                required: self.min_observations(),
                actual: 0,
            })?;
        let centered = returns - &means.insert_axis(Axis(0));

        let scale = self.config.frequency as f64 / (n_periods - self.config.ddof) as f64;
        let cov = centered.t().dot(&centered) * scale;

        // Exact symmetry for downstream checks
        let transposed = cov.t().to_owned();
        Ok((cov + transposed) * 0.5)
    }
}
