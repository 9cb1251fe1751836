#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod correlation;
pub mod covariance;
pub mod error;
pub mod linalg;
pub mod returns;

pub use correlation::{correlation_from_covariance, pearson_correlation};
pub use covariance::{
    CovarianceEstimator, CovarianceMatrix, SampleCovarianceConfig, SampleCovarianceEstimator,
};
pub use error::RiskError;
pub use returns::{
    ReturnVector, ReturnsConfig, ReturnsEstimator, ReturnsMethod, TRADING_DAYS_PER_YEAR,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
