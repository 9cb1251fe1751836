//! Expected return estimation.
//!
//! The default estimate is the arithmetic mean of simple period returns scaled
//! by the number of periods per year. The compounded alternative is the
//! geometric growth rate `(p_last / p_first)^(frequency / n) - 1`.

use crate::error::RiskError;
use hobart_data::{PriceMatrix, ReturnSeries};
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};

/// Default number of trading periods per year.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// How per-period returns are turned into an annual expected return.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReturnsMethod {
    /// Mean simple return × frequency
    #[default]
    Mean,

    /// Compound annual growth rate
    Compounded,
}

/// Returns estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnsConfig {
    /// Periods per year (default: 252)
    pub frequency: usize,

    /// Annualization method (default: mean)
    pub method: ReturnsMethod,
}

impl Default for ReturnsConfig {
    fn default() -> Self {
        Self {
            frequency: TRADING_DAYS_PER_YEAR,
            method: ReturnsMethod::Mean,
        }
    }
}

/// Annualized expected return per asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnVector {
    tickers: Vec<String>,
    values: Array1<f64>,
}

impl ReturnVector {
    /// Create a return vector.
    ///
    /// # Errors
    /// Fails if the label count differs from the value count or a value is not finite.
    pub fn new(tickers: Vec<String>, values: Array1<f64>) -> Result<Self, RiskError> {
        if tickers.len() != values.len() {
            return Err(RiskError::DimensionMismatch {
                expected: tickers.len(),
                actual: values.len(),
            });
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(RiskError::InvalidParameter(format!(
                "expected return for {} is not finite",
                tickers[idx]
            )));
        }
        Ok(Self { tickers, values })
    }

    /// Asset tickers.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Expected returns, aligned with [`tickers`](Self::tickers).
    pub const fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no assets.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Expected return of a single ticker.
    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map(|idx| self.values[idx])
    }

    /// Largest expected return across assets.
    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }
}

/// Expected return estimator
#[derive(Debug, Clone, Default)]
pub struct ReturnsEstimator {
    config: ReturnsConfig,
}

impl ReturnsEstimator {
    /// Create a new estimator
    ///
    /// # Errors
    /// Returns an error if the frequency is zero.
    pub fn new(config: ReturnsConfig) -> Result<Self, RiskError> {
        if config.frequency == 0 {
            return Err(RiskError::InvalidParameter(
                "frequency must be positive".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Estimator configuration
    pub const fn config(&self) -> &ReturnsConfig {
        &self.config
    }

    /// Annualized expected returns from prices.
    ///
    /// # Errors
    /// Returns an insufficient-data error with fewer than two price rows.
    pub fn estimate(&self, prices: &PriceMatrix) -> Result<ReturnVector, RiskError> {
        self.estimate_from_returns(&prices.returns()?)
    }

    /// Annualized expected returns from an existing return series.
    ///
    /// # Errors
    /// Returns an insufficient-data error for an empty series.
    pub fn estimate_from_returns(&self, returns: &ReturnSeries) -> Result<ReturnVector, RiskError> {
        let n_periods = returns.n_periods();
        if n_periods == 0 {
            return Err(RiskError::InsufficientData {
                what: "return observations",
                required: 1,
                actual: 0,
            });
        }

        let frequency = self.config.frequency as f64;
        let values = match self.config.method {
            ReturnsMethod::Mean => returns
                .values()
                .mean_axis(Axis(0))
                .map(|mean| mean * frequency)
                .ok_or(RiskError::InsufficientData {
                    what: "return observations",
                    required: 1,
                    actual: 0,
                })?,
            ReturnsMethod::Compounded => {
                let growth = returns
                    .values()
                    .map_axis(Axis(0), |col| col.iter().map(|r| 1.0 + r).product::<f64>());
                growth.mapv(|g| g.powf(frequency / n_periods as f64) - 1.0)
            }
        };

        ReturnVector::new(returns.tickers().to_vec(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ndarray::Array2;
    use rstest::rstest;

    fn prices(values: Vec<f64>) -> PriceMatrix {
        let n = values.len();
        let dates = (0..n)
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64))
            .collect();
        PriceMatrix::new(
            dates,
            vec!["AAA".to_string()],
            Array2::from_shape_vec((n, 1), values).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_mean_annualization() {
        // Returns: +10%, -10%, +5%
        let p = prices(vec![100.0, 110.0, 99.0, 103.95]);
        let estimator = ReturnsEstimator::default();
        let mu = estimator.estimate(&p).unwrap();

        let expected = (0.10 - 0.10 + 0.05) / 3.0 * 252.0;
        assert_relative_eq!(mu.values()[0], expected, epsilon = 1e-10);
        assert_relative_eq!(mu.get("AAA").unwrap(), expected, epsilon = 1e-10);
    }

    #[test]
    fn test_compounded_matches_price_ratio() {
        let p = prices(vec![100.0, 110.0, 99.0, 103.95]);
        let estimator = ReturnsEstimator::new(ReturnsConfig {
            method: ReturnsMethod::Compounded,
            ..Default::default()
        })
        .unwrap();
        let mu = estimator.estimate(&p).unwrap();

        let expected = (103.95_f64 / 100.0).powf(252.0 / 3.0) - 1.0;
        assert_relative_eq!(mu.values()[0], expected, max_relative = 1e-10);
    }

    #[rstest]
    #[case(1)]
    #[case(52)]
    #[case(252)]
    fn test_frequency_scales_linearly(#[case] frequency: usize) {
        let p = prices(vec![100.0, 101.0, 102.01]);
        let estimator = ReturnsEstimator::new(ReturnsConfig {
            frequency,
            ..Default::default()
        })
        .unwrap();
        let mu = estimator.estimate(&p).unwrap();
        assert_relative_eq!(mu.values()[0], 0.01 * frequency as f64, epsilon = 1e-10);
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let p = prices(vec![100.0]);
        let err = ReturnsEstimator::default().estimate(&p).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let config = ReturnsConfig {
            frequency: 0,
            ..Default::default()
        };
        assert!(ReturnsEstimator::new(config).is_err());
    }
}
