//! Hierarchical Risk Parity
//!
//! Allocates without inverting the covariance matrix:
//!
//! 1. Correlation distance `d(i, j) = sqrt(½ (1 - ρ(i, j)))`.
//! 2. Single-linkage clustering tree on `d`.
//! 3. Seriation: leaves in tree order, so correlated assets sit together.
//! 4. Recursive bisection: each block is split at its tree fork and its
//!    weight is shared between the halves in inverse proportion to their
//!    cluster variances.
//!
//! The bisection walks the flat merge table with an explicit stack of index
//! ranges over the leaf order.

pub mod linkage;

pub use linkage::{LinkageTree, Merge};

use crate::error::OptimError;
use crate::mean_variance::DEFAULT_RISK_FREE_RATE;
use crate::stats::PerformanceStats;
use crate::weights::{DEFAULT_CLEANING_THRESHOLD, WeightVector};
use hobart_data::ReturnSeries;
use hobart_risk::{
    CovarianceEstimator, ReturnsConfig, ReturnsEstimator, RiskError, SampleCovarianceConfig,
    SampleCovarianceEstimator, pearson_correlation,
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

/// How the variance of a cluster is measured during bisection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClusterVariance {
    /// Inverse-variance weights over the diagonal only
    #[default]
    Diagonal,
    /// Inverse-variance weights over the full covariance sub-block
    Full,
}

/// HRP configuration
#[derive(Debug, Clone)]
pub struct HrpConfig {
    /// Cluster variance measure (default: diagonal)
    pub cluster_variance: ClusterVariance,

    /// Estimation of the expected returns used for reporting
    pub returns: ReturnsConfig,

    /// Annual risk-free rate for the Sharpe ratio (default: 0.02)
    pub risk_free_rate: f64,

    /// Weights below this magnitude are zeroed (default: 1e-4)
    pub cleaning_threshold: f64,
}

impl Default for HrpConfig {
    fn default() -> Self {
        Self {
            cluster_variance: ClusterVariance::Diagonal,
            returns: ReturnsConfig::default(),
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            cleaning_threshold: DEFAULT_CLEANING_THRESHOLD,
        }
    }
}

/// HRP weights with the clustering that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct HrpAllocation {
    /// Portfolio weights
    pub weights: WeightVector,
    /// Statistics of `weights` under the sample covariance
    pub performance: PerformanceStats,
    /// Tickers in seriated order
    pub ordering: Vec<String>,
    /// Clustering tree over asset indices
    pub tree: LinkageTree,
}

/// Hierarchical Risk Parity allocator
#[derive(Debug, Clone, Default)]
pub struct HierarchicalRiskParity {
    config: HrpConfig,
}

impl HierarchicalRiskParity {
    /// Create an allocator.
    pub const fn new(config: HrpConfig) -> Self {
        Self { config }
    }

    /// Allocator configuration
    pub const fn config(&self) -> &HrpConfig {
        &self.config
    }

    /// Allocate across the assets of `returns`.
    ///
    /// # Errors
    /// Insufficient data with fewer than two assets or two observations;
    /// singular covariance when an asset has zero variance.
    pub fn allocate(&self, returns: &ReturnSeries) -> Result<HrpAllocation, OptimError> {
        let n_assets = returns.n_assets();
        if n_assets < 2 {
            return Err(OptimError::InsufficientData {
                what: "assets",
                required: 2,
                actual: n_assets,
            });
        }
        if returns.n_periods() < 2 {
            return Err(OptimError::InsufficientData {
                what: "return observations",
                required: 2,
                actual: returns.n_periods(),
            });
        }

        let covariance = SampleCovarianceEstimator::new(SampleCovarianceConfig {
            frequency: self.config.returns.frequency,
            ..Default::default()
        })?
        .estimate_series(returns)?;
        if let Some(idx) = covariance.variances().iter().position(|v| *v <= 0.0) {
            return Err(RiskError::SingularCovariance(format!(
                "asset {} has zero variance",
                returns.tickers()[idx]
            ))
            .into());
        }

        let correlation = pearson_correlation(returns.values())?;
        let tree = LinkageTree::single_linkage(&correlation_distance(&correlation))?;
        let order = tree.leaf_order();

        let raw = bisect(&tree, &order, covariance.values(), self.config.cluster_variance);
        let weights = WeightVector::new(returns.tickers().to_vec(), raw)?
            .clean(self.config.cleaning_threshold);

        let expected = ReturnsEstimator::new(self.config.returns.clone())?
            .estimate_from_returns(returns)?;
        let performance =
            PerformanceStats::of(&weights, &expected, &covariance, self.config.risk_free_rate)?;

        let ordering = order
            .iter()
            .map(|&i| returns.tickers()[i].clone())
            .collect();

        info!(
            assets = n_assets,
            observations = returns.n_periods(),
            "hierarchical risk parity allocation"
        );
        Ok(HrpAllocation {
            weights,
            performance,
            ordering,
            tree,
        })
    }
}

/// `sqrt(½ (1 - ρ))`, clamped into `[0, 1]` against round-off.
pub fn correlation_distance(correlation: &Array2<f64>) -> Array2<f64> {
    correlation.mapv(|rho| (0.5 * (1.0 - rho)).clamp(0.0, 1.0).sqrt())
}

/// Top-down weight split over the tree, normalized to sum to one.
fn bisect(
    tree: &LinkageTree,
    order: &[usize],
    covariance: &Array2<f64>,
    mode: ClusterVariance,
) -> Array1<f64> {
    let mut weights = Array1::<f64>::zeros(order.len());
    let mut stack = vec![(tree.root(), 0, order.len(), 1.0)];

    while let Some((node, start, end, weight)) = stack.pop() {
        let Some((left, right)) = tree.children(node) else {
            weights[order[start]] = weight;
            continue;
        };
        let split = start + tree.size(left);
        let var_left = cluster_variance(covariance, &order[start..split], mode);
        let var_right = cluster_variance(covariance, &order[split..end], mode);
        let total = var_left + var_right;
        let alpha = if total > 0.0 {
            1.0 - var_left / total
        } else {
            0.5
        };

        stack.push((left, start, split, weight * alpha));
        stack.push((right, split, end, weight * (1.0 - alpha)));
    }

    let total = weights.sum();
    if total > 0.0 { weights / total } else { weights }
}

/// Variance of the inverse-variance portfolio over `members`.
fn cluster_variance(covariance: &Array2<f64>, members: &[usize], mode: ClusterVariance) -> f64 {
    let inverse: Vec<f64> = members.iter().map(|&i| 1.0 / covariance[[i, i]]).collect();
    let total: f64 = inverse.iter().sum();
    let ivp: Vec<f64> = inverse.iter().map(|x| x / total).collect();

    match mode {
        ClusterVariance::Diagonal => members
            .iter()
            .zip(&ivp)
            .map(|(&i, w)| w * w * covariance[[i, i]])
            .sum(),
        ClusterVariance::Full => {
            let mut variance = 0.0;
            for (a, &i) in members.iter().enumerate() {
                for (b, &j) in members.iter().enumerate() {
                    variance += ivp[a] * ivp[b] * covariance[[i, j]];
                }
            }
            variance
        }
    }
}
