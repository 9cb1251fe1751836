//! Mean-variance (Markowitz) optimization.
//!
//! Three problems are solved over long-only (by default) fully invested
//! portfolios:
//!
//! - **Minimum volatility**: `min wᵀSw` subject to `Σw = 1` and bounds.
//! - **Target return**: the same with the extra equality `μᵀw = target`.
//! - **Maximum Sharpe**: `max (μᵀw - r_f) / sqrt(wᵀSw)`. With `y = κw` and
//!   `κ = Σy > 0` this becomes the convex problem
//!   `min yᵀSy` subject to `(μ - r_f)ᵀy = 1`, `lo·κ ≤ y ≤ hi·κ`; the weights
//!   are recovered as `w = y / Σy`.
//!
//! Results are cleaned (tiny weights zeroed, rest renormalized) before the
//! performance statistics are computed, so re-evaluating the reported weights
//! reproduces the reported statistics.

use crate::error::{OptimError, OptimizationMode, SolverError};
use crate::qp::{ConvexQpSolver, DualActiveSetSolver, QuadraticProgram, SolverConfig};
use crate::stats::PerformanceStats;
use crate::weights::{DEFAULT_CLEANING_THRESHOLD, WeightBounds, WeightVector};
use hobart_risk::{CovarianceMatrix, ReturnVector};
use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::{debug, info};

/// Default annual risk-free rate.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Mean-variance optimizer configuration
#[derive(Debug, Clone)]
pub struct MeanVarianceConfig {
    /// Annual risk-free rate (default: 0.02)
    pub risk_free_rate: f64,

    /// Weight bounds (default: `[0, 1]` per asset)
    pub bounds: WeightBounds,

    /// Weights below this magnitude are zeroed (default: 1e-4)
    pub cleaning_threshold: f64,

    /// Settings for the bundled solver
    pub solver: SolverConfig,
}

impl Default for MeanVarianceConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            bounds: WeightBounds::default(),
            cleaning_threshold: DEFAULT_CLEANING_THRESHOLD,
            solver: SolverConfig::default(),
        }
    }
}

/// Cleaned weights with their performance statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    /// Portfolio weights
    pub weights: WeightVector,
    /// Statistics of `weights`
    pub performance: PerformanceStats,
}

/// Mean-variance optimizer over a pluggable QP solver.
#[derive(Debug, Clone)]
pub struct MeanVarianceOptimizer<S = DualActiveSetSolver> {
    config: MeanVarianceConfig,
    solver: S,
}

impl MeanVarianceOptimizer {
    /// Create an optimizer backed by [`DualActiveSetSolver`].
    pub fn new(config: MeanVarianceConfig) -> Self {
        let solver = DualActiveSetSolver::new(config.solver);
        Self { config, solver }
    }
}

impl Default for MeanVarianceOptimizer {
    fn default() -> Self {
        Self::new(MeanVarianceConfig::default())
    }
}

impl<S: ConvexQpSolver> MeanVarianceOptimizer<S> {
    /// Create an optimizer with a custom solver.
    pub const fn with_solver(config: MeanVarianceConfig, solver: S) -> Self {
        Self { config, solver }
    }

    /// Optimizer configuration
    pub const fn config(&self) -> &MeanVarianceConfig {
        &self.config
    }

    /// Portfolio with the highest Sharpe ratio.
    ///
    /// # Errors
    /// [`OptimError::NoExcessReturn`] when long-only and no asset beats the
    /// risk-free rate, solver errors tagged [`OptimizationMode::MaxSharpe`],
    /// and input validation errors.
    pub fn max_sharpe(
        &self,
        expected_returns: &ReturnVector,
        covariance: &CovarianceMatrix,
    ) -> Result<Allocation, OptimError> {
        let raw = self.solve_max_sharpe(expected_returns, covariance)?;
        let allocation = self.allocate(raw, expected_returns, covariance)?;
        info!(
            sharpe = allocation.performance.sharpe_ratio,
            "max sharpe portfolio"
        );
        Ok(allocation)
    }

    /// Global minimum-volatility portfolio.
    ///
    /// # Errors
    /// Solver errors tagged [`OptimizationMode::MinVolatility`] and input
    /// validation errors.
    pub fn min_volatility(
        &self,
        expected_returns: &ReturnVector,
        covariance: &CovarianceMatrix,
    ) -> Result<Allocation, OptimError> {
        let raw = self.solve_min_volatility(expected_returns, covariance)?;
        let allocation = self.allocate(raw, expected_returns, covariance)?;
        info!(
            volatility = allocation.performance.annual_volatility,
            "min volatility portfolio"
        );
        Ok(allocation)
    }

    /// Minimum-volatility weights earning exactly `target_return`.
    ///
    /// The weights are not cleaned.
    ///
    /// # Errors
    /// [`SolverError::Infeasible`] tagged [`OptimizationMode::TargetReturn`]
    /// when the target is out of reach under the bounds.
    pub fn at_target_return(
        &self,
        expected_returns: &ReturnVector,
        covariance: &CovarianceMatrix,
        target_return: f64,
    ) -> Result<WeightVector, OptimError> {
        if !target_return.is_finite() {
            return Err(OptimError::InvalidParameter(format!(
                "target return {target_return}"
            )));
        }
        let (lower, upper) = self.validate(expected_returns, covariance)?;
        let problem = fully_invested(covariance.values(), &lower, &upper)
            .equality(expected_returns.values().clone(), target_return);
        let x = self.run(&problem, OptimizationMode::TargetReturn)?;
        WeightVector::new(covariance.tickers().to_vec(), x)
    }

    /// Statistics of arbitrary weights under this optimizer's risk-free rate.
    ///
    /// # Errors
    /// Fails on mismatched ticker labels.
    pub fn portfolio_performance(
        &self,
        weights: &WeightVector,
        expected_returns: &ReturnVector,
        covariance: &CovarianceMatrix,
    ) -> Result<PerformanceStats, OptimError> {
        PerformanceStats::of(
            weights,
            expected_returns,
            covariance,
            self.config.risk_free_rate,
        )
    }

    /// Clean raw solver weights and attach their statistics.
    pub(crate) fn allocate(
        &self,
        raw: WeightVector,
        expected_returns: &ReturnVector,
        covariance: &CovarianceMatrix,
    ) -> Result<Allocation, OptimError> {
        let weights = raw.clean(self.config.cleaning_threshold);
        let performance = self.portfolio_performance(&weights, expected_returns, covariance)?;
        Ok(Allocation {
            weights,
            performance,
        })
    }

    /// Uncleaned minimum-volatility weights.
    pub(crate) fn solve_min_volatility(
        &self,
        expected_returns: &ReturnVector,
        covariance: &CovarianceMatrix,
    ) -> Result<WeightVector, OptimError> {
        let (lower, upper) = self.validate(expected_returns, covariance)?;
        let problem = fully_invested(covariance.values(), &lower, &upper);
        let x = self.run(&problem, OptimizationMode::MinVolatility)?;
        WeightVector::new(covariance.tickers().to_vec(), x)
    }

    /// Uncleaned maximum-Sharpe weights.
    pub(crate) fn solve_max_sharpe(
        &self,
        expected_returns: &ReturnVector,
        covariance: &CovarianceMatrix,
    ) -> Result<WeightVector, OptimError> {
        let (lower, upper) = self.validate(expected_returns, covariance)?;
        let rf = self.config.risk_free_rate;
        let max_return = expected_returns.max().unwrap_or(f64::NEG_INFINITY);
        if self.config.bounds.is_long_only() && max_return <= rf {
            return Err(OptimError::NoExcessReturn {
                risk_free_rate: rf,
                max_return,
            });
        }

        let n = lower.len();
        let ones = Array1::<f64>::ones(n);
        let mut problem = QuadraticProgram::new(covariance.values() * 2.0, Array1::zeros(n))
            .equality(expected_returns.values() - rf, 1.0)
            .greater_equal(ones.clone(), 0.0);

        // y_i >= lo_i * κ and y_i <= hi_i * κ with κ = Σy
        for i in 0..n {
            if lower[i].is_finite() {
                let mut normal = &ones * -lower[i];
                normal[i] += 1.0;
                problem = problem.greater_equal(normal, 0.0);
            }
            if upper[i].is_finite() {
                let mut normal = &ones * upper[i];
                normal[i] -= 1.0;
                problem = problem.greater_equal(normal, 0.0);
            }
        }

        let y = self.run(&problem, OptimizationMode::MaxSharpe)?;
        let kappa = y.sum();
        if kappa <= self.config.solver.tolerance {
            return Err(OptimError::solver(
                OptimizationMode::MaxSharpe,
                SolverError::DidNotConverge {
                    iterations: 0,
                    reason: format!("scaling variable collapsed to {kappa:.3e}"),
                },
            ));
        }
        debug!(kappa, "recovered max sharpe scaling");
        WeightVector::new(covariance.tickers().to_vec(), y / kappa)
    }

    fn run(
        &self,
        problem: &QuadraticProgram,
        mode: OptimizationMode,
    ) -> Result<Array1<f64>, OptimError> {
        let solution = self
            .solver
            .solve(problem)
            .map_err(|err| OptimError::solver(mode, err))?;
        debug!(%mode, iterations = solution.iterations, "solver finished");
        Ok(solution.x)
    }

    fn validate(
        &self,
        expected_returns: &ReturnVector,
        covariance: &CovarianceMatrix,
    ) -> Result<(Vec<f64>, Vec<f64>), OptimError> {
        if covariance.is_empty() {
            return Err(OptimError::InsufficientData {
                what: "assets",
                required: 1,
                actual: 0,
            });
        }
        if !self.config.risk_free_rate.is_finite() {
            return Err(OptimError::InvalidParameter(format!(
                "risk-free rate {}",
                self.config.risk_free_rate
            )));
        }
        covariance.ensure_same_tickers(expected_returns.tickers())?;
        covariance.ensure_positive_definite()?;
        self.config.bounds.resolve(covariance.len())
    }
}

/// `min wᵀSw` subject to `Σw = 1` and box bounds.
fn fully_invested(covariance: &Array2<f64>, lower: &[f64], upper: &[f64]) -> QuadraticProgram {
    let n = lower.len();
    QuadraticProgram::new(covariance * 2.0, Array1::zeros(n))
        .equality(Array1::ones(n), 1.0)
        .box_bounds(lower, upper)
}
