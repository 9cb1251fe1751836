//! Efficient frontier sampling.

use crate::error::OptimError;
use crate::mean_variance::{Allocation, MeanVarianceOptimizer};
use crate::qp::{ConvexQpSolver, DualActiveSetSolver};
use hobart_risk::{CovarianceMatrix, ReturnVector};
use ndarray::Array1;
use rayon::prelude::*;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use tracing::{debug, info};

/// Default number of frontier samples.
pub const DEFAULT_FRONTIER_POINTS: usize = 100;

/// Relative gap below which two expected returns are treated as equal.
const RETURN_RESOLUTION: f64 = 1e-12;

/// One (volatility, expected return) pair on the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrontierPoint {
    /// Annual volatility
    pub risk: f64,
    /// Expected annual return
    #[serde(rename = "return")]
    pub expected_return: f64,
}

/// Frontier points in strictly increasing return order.
///
/// Serializes as parallel `risk` and `return` arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontierCurve {
    points: Vec<FrontierPoint>,
}

impl FrontierCurve {
    /// Build a curve, sorting by return and dropping repeated returns.
    pub fn new(mut points: Vec<FrontierPoint>) -> Self {
        points.sort_by(|a, b| a.expected_return.total_cmp(&b.expected_return));
        points.dedup_by(|later, earlier| {
            later.expected_return - earlier.expected_return
                <= RETURN_RESOLUTION * earlier.expected_return.abs().max(1.0)
        });
        Self { points }
    }

    /// Points in order.
    pub fn points(&self) -> &[FrontierPoint] {
        &self.points
    }

    /// Volatilities in order.
    pub fn risks(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.risk).collect()
    }

    /// Expected returns in order.
    pub fn returns(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.expected_return).collect()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Serialize for FrontierCurve {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FrontierCurve", 2)?;
        state.serialize_field("risk", &self.risks())?;
        state.serialize_field("return", &self.returns())?;
        state.end()
    }
}

/// Sampled frontier with its two reference portfolios.
#[derive(Debug, Clone, Serialize)]
pub struct FrontierResult {
    /// Feasible frontier points, from uncleaned weights.
    ///
    /// The first point is the uncleaned minimum-volatility portfolio and no
    /// later point has lower risk.
    pub frontier: FrontierCurve,
    /// Maximum-Sharpe portfolio
    pub max_sharpe: Allocation,
    /// Minimum-volatility portfolio after cleaning.
    ///
    /// Cleaning can raise its volatility slightly above the first frontier
    /// point, by at most the effect of the dropped weights.
    pub min_volatility: Allocation,
    /// Number of targets attempted
    pub requested: usize,
    /// Targets skipped as infeasible
    pub skipped: usize,
}

/// Samples the efficient frontier between the minimum-volatility return and
/// the largest single-asset expected return.
#[derive(Debug, Clone)]
pub struct EfficientFrontier<S = DualActiveSetSolver> {
    optimizer: MeanVarianceOptimizer<S>,
    points: usize,
}

impl<S: ConvexQpSolver> EfficientFrontier<S> {
    /// Create a sampler drawing `points` targets.
    ///
    /// # Errors
    /// Fails if `points` is zero.
    pub fn new(optimizer: MeanVarianceOptimizer<S>, points: usize) -> Result<Self, OptimError> {
        if points == 0 {
            return Err(OptimError::InvalidParameter(
                "frontier needs at least one point".to_string(),
            ));
        }
        Ok(Self { optimizer, points })
    }

    /// Underlying optimizer.
    pub const fn optimizer(&self) -> &MeanVarianceOptimizer<S> {
        &self.optimizer
    }

    /// Sample the frontier.
    ///
    /// Targets are solved in parallel. Infeasible targets are skipped; any
    /// other error aborts the whole computation.
    ///
    /// # Errors
    /// [`OptimError::NoFeasibleFrontierPoints`] when every target is
    /// infeasible; errors from the max-Sharpe and min-volatility solves.
    pub fn sample(
        &self,
        expected_returns: &ReturnVector,
        covariance: &CovarianceMatrix,
    ) -> Result<FrontierResult, OptimError> {
        let min_vol_raw = self
            .optimizer
            .solve_min_volatility(expected_returns, covariance)?;
        let lower = min_vol_raw.values().dot(expected_returns.values());
        let upper = expected_returns.max().unwrap_or(lower);

        let targets = if upper - lower > RETURN_RESOLUTION * upper.abs().max(1.0) {
            Array1::linspace(lower, upper, self.points).to_vec()
        } else {
            vec![lower]
        };
        let requested = targets.len();

        let solved = targets
            .into_par_iter()
            .map(|target| {
                match self
                    .optimizer
                    .at_target_return(expected_returns, covariance, target)
                {
                    Ok(weights) => {
                        let stats = self.optimizer.portfolio_performance(
                            &weights,
                            expected_returns,
                            covariance,
                        )?;
                        Ok(Some(FrontierPoint {
                            risk: stats.annual_volatility,
                            expected_return: stats.expected_annual_return,
                        }))
                    }
                    Err(err) if err.is_infeasible() => {
                        debug!(target, error = %err, "skipping infeasible frontier target");
                        Ok(None)
                    }
                    Err(err) => Err(err),
                }
            })
            .collect::<Result<Vec<Option<FrontierPoint>>, OptimError>>()?;

        let points: Vec<FrontierPoint> = solved.into_iter().flatten().collect();
        let skipped = requested - points.len();
        if points.is_empty() {
            return Err(OptimError::NoFeasibleFrontierPoints { requested });
        }
        let frontier = FrontierCurve::new(points);

        let min_volatility = self
            .optimizer
            .allocate(min_vol_raw, expected_returns, covariance)?;
        let max_sharpe = self.optimizer.max_sharpe(expected_returns, covariance)?;

        info!(
            points = frontier.len(),
            skipped, lower, upper, "efficient frontier sampled"
        );
        Ok(FrontierResult {
            frontier,
            max_sharpe,
            min_volatility,
            requested,
            skipped,
        })
    }
}
