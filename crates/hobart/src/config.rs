//! Engine configuration.
//!
//! Every field has a default, so a JSON file only needs to name the values it
//! overrides:
//!
//! ```json
//! { "risk_free_rate": 0.03, "upper_bound": 0.4, "solver": { "max_iterations": 1000 } }
//! ```

use crate::error::EngineError;
use hobart_optim::{
    ClusterVariance, DEFAULT_CLEANING_THRESHOLD, DEFAULT_FRONTIER_POINTS, DEFAULT_RISK_FREE_RATE,
    HrpConfig, MeanVarianceConfig, SolverConfig, WeightBounds,
};
use hobart_risk::{ReturnsConfig, ReturnsMethod, SampleCovarianceConfig, TRADING_DAYS_PER_YEAR};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration shared by all engine operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Annual risk-free rate (default: 0.02)
    pub risk_free_rate: f64,

    /// Lower weight bound for every asset (default: 0.0)
    pub lower_bound: f64,

    /// Upper weight bound for every asset (default: 1.0)
    pub upper_bound: f64,

    /// Number of frontier samples (default: 100)
    pub frontier_points: usize,

    /// Periods per year (default: 252)
    pub frequency: usize,

    /// Weights below this magnitude are zeroed (default: 1e-4)
    pub cleaning_threshold: f64,

    /// Expected return estimator (default: mean)
    pub returns_method: ReturnsMethod,

    /// HRP cluster variance measure (default: diagonal)
    pub cluster_variance: ClusterVariance,

    /// QP solver settings
    pub solver: SolverConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            lower_bound: 0.0,
            upper_bound: 1.0,
            frontier_points: DEFAULT_FRONTIER_POINTS,
            frequency: TRADING_DAYS_PER_YEAR,
            cleaning_threshold: DEFAULT_CLEANING_THRESHOLD,
            returns_method: ReturnsMethod::Mean,
            cluster_variance: ClusterVariance::Diagonal,
            solver: SolverConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    /// Fails on malformed JSON, unknown fields, or values rejected by
    /// [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    /// Fails when the file cannot be read or does not parse.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check that every value is usable.
    ///
    /// Bounds are checked independently of the asset count here; the
    /// optimizer repeats the check once the number of assets is known.
    ///
    /// # Errors
    /// [`EngineError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: String| Err(EngineError::Config(msg));

        if !self.risk_free_rate.is_finite() {
            return invalid(format!("risk_free_rate must be finite, got {}", self.risk_free_rate));
        }
        if !self.lower_bound.is_finite() || !self.upper_bound.is_finite() {
            return invalid(format!(
                "weight bounds must be finite, got [{}, {}]",
                self.lower_bound, self.upper_bound
            ));
        }
        if self.lower_bound > self.upper_bound {
            return invalid(format!(
                "lower_bound {} exceeds upper_bound {}",
                self.lower_bound, self.upper_bound
            ));
        }
        // n * lower <= 1 <= n * upper must hold for some n >= 1
        if self.upper_bound <= 0.0 || self.lower_bound > 1.0 {
            return invalid(format!(
                "weights in [{}, {}] can never sum to 1",
                self.lower_bound, self.upper_bound
            ));
        }
        if self.frontier_points == 0 {
            return invalid("frontier_points must be positive".to_string());
        }
        if self.frequency == 0 {
            return invalid("frequency must be positive".to_string());
        }
        if !(0.0..1.0).contains(&self.cleaning_threshold) {
            return invalid(format!(
                "cleaning_threshold must be in [0, 1), got {}",
                self.cleaning_threshold
            ));
        }
        if self.solver.max_iterations == 0 {
            return invalid("solver.max_iterations must be positive".to_string());
        }
        if !(self.solver.tolerance.is_finite() && self.solver.tolerance > 0.0) {
            return invalid(format!(
                "solver.tolerance must be positive, got {}",
                self.solver.tolerance
            ));
        }
        Ok(())
    }

    /// Uniform weight bounds.
    pub const fn bounds(&self) -> WeightBounds {
        WeightBounds::uniform(self.lower_bound, self.upper_bound)
    }

    /// Expected return estimator settings.
    pub const fn returns_config(&self) -> ReturnsConfig {
        ReturnsConfig {
            frequency: self.frequency,
            method: self.returns_method,
        }
    }

    /// Covariance estimator settings.
    pub const fn covariance_config(&self) -> SampleCovarianceConfig {
        SampleCovarianceConfig {
            frequency: self.frequency,
            ddof: 1,
        }
    }

    /// Mean-variance optimizer settings.
    pub const fn mean_variance_config(&self) -> MeanVarianceConfig {
        MeanVarianceConfig {
            risk_free_rate: self.risk_free_rate,
            bounds: self.bounds(),
            cleaning_threshold: self.cleaning_threshold,
            solver: self.solver,
        }
    }

    /// HRP settings.
    pub const fn hrp_config(&self) -> HrpConfig {
        HrpConfig {
            cluster_variance: self.cluster_variance,
            returns: self.returns_config(),
            risk_free_rate: self.risk_free_rate,
            cleaning_threshold: self.cleaning_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.risk_free_rate, 0.02);
        assert_eq!(config.frontier_points, 100);
        assert_eq!(config.frequency, 252);
        assert_eq!(config.returns_method, ReturnsMethod::Mean);
        assert_eq!(config.cluster_variance, ClusterVariance::Diagonal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json_str(
            r#"{"upper_bound": 0.4, "returns_method": "compounded", "solver": {"max_iterations": 50}}"#,
        )
        .unwrap();
        assert_eq!(config.upper_bound, 0.4);
        assert_eq!(config.lower_bound, 0.0);
        assert_eq!(config.returns_method, ReturnsMethod::Compounded);
        assert_eq!(config.solver.max_iterations, 50);
        assert_eq!(config.solver.tolerance, 1e-10);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"risk_free": 0.01}"#),
            Err(EngineError::ConfigParse(_))
        ));
    }

    #[rstest]
    #[case::lower_above_upper(r#"{"lower_bound": 0.6, "upper_bound": 0.5}"#)]
    #[case::upper_not_positive(r#"{"lower_bound": -0.5, "upper_bound": 0.0}"#)]
    #[case::lower_above_one(r#"{"lower_bound": 1.5, "upper_bound": 2.0}"#)]
    #[case::zero_points(r#"{"frontier_points": 0}"#)]
    #[case::zero_frequency(r#"{"frequency": 0}"#)]
    #[case::negative_threshold(r#"{"cleaning_threshold": -0.1}"#)]
    #[case::zero_tolerance(r#"{"solver": {"tolerance": 0.0}}"#)]
    fn test_invalid_values(#[case] json: &str) {
        let err = EngineConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)), "{err}");
        assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_sub_configs_follow_fields() {
        let config = EngineConfig {
            risk_free_rate: 0.01,
            frequency: 52,
            upper_bound: 0.3,
            ..Default::default()
        };
        let mv = config.mean_variance_config();
        assert_eq!(mv.risk_free_rate, 0.01);
        assert_eq!(mv.bounds, WeightBounds::uniform(0.0, 0.3));
        assert_eq!(config.hrp_config().returns.frequency, 52);
        assert_eq!(config.covariance_config().frequency, 52);
    }
}
