#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod frontier;
pub mod hrp;
pub mod mean_variance;
pub mod qp;
pub mod stats;
pub mod weights;

pub use error::{OptimError, OptimizationMode, SolverError};
pub use frontier::{
    DEFAULT_FRONTIER_POINTS, EfficientFrontier, FrontierCurve, FrontierPoint, FrontierResult,
};
pub use hrp::{ClusterVariance, HierarchicalRiskParity, HrpAllocation, HrpConfig, LinkageTree};
pub use mean_variance::{
    Allocation, DEFAULT_RISK_FREE_RATE, MeanVarianceConfig, MeanVarianceOptimizer,
};
pub use qp::{ConvexQpSolver, DualActiveSetSolver, QpSolution, QuadraticProgram, SolverConfig};
pub use stats::PerformanceStats;
pub use weights::{DEFAULT_CLEANING_THRESHOLD, WeightBounds, WeightVector};

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
