//! Engine operations.
//!
//! Each operation has a `try_` form returning the full-precision result and an
//! [`Outcome`] form returning the display record that crosses the boundary.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::outcome::Outcome;
use hobart_data::{PriceMatrix, PriceSeries};
use hobart_optim::{
    Allocation, EfficientFrontier, FrontierResult, HierarchicalRiskParity, HrpAllocation,
    MeanVarianceOptimizer, OptimizationMode, PerformanceStats, WeightVector,
};
use hobart_output::{
    AllocationReport, BacktestReport, FormattedPerformance, FrontierReport, PerformanceEvaluator,
};
use hobart_risk::{
    CovarianceEstimator, CovarianceMatrix, ReturnVector, ReturnsEstimator,
    SampleCovarianceEstimator,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument};

/// Allocation methods producing a single weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    /// Maximum Sharpe ratio
    MaxSharpe,
    /// Global minimum volatility
    MinVolatility,
    /// Hierarchical risk parity
    Hrp,
}

impl From<AllocationMethod> for OptimizationMode {
    fn from(method: AllocationMethod) -> Self {
        match method {
            AllocationMethod::MaxSharpe => Self::MaxSharpe,
            AllocationMethod::MinVolatility => Self::MinVolatility,
            AllocationMethod::Hrp => Self::Hrp,
        }
    }
}

impl fmt::Display for AllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        OptimizationMode::from(*self).fmt(f)
    }
}

/// Portfolio allocation engine.
///
/// Holds only configuration; every operation is a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine.
    ///
    /// # Errors
    /// Fails when the configuration does not validate.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Engine configuration
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn optimizer(&self) -> MeanVarianceOptimizer {
        MeanVarianceOptimizer::new(self.config.mean_variance_config())
    }

    /// Annualized expected returns and covariance of `prices`.
    ///
    /// # Errors
    /// Insufficient data with fewer than three price rows.
    #[instrument(skip_all, fields(assets = prices.n_assets(), observations = prices.n_periods()))]
    pub fn estimate(
        &self,
        prices: &PriceMatrix,
    ) -> Result<(ReturnVector, CovarianceMatrix), EngineError> {
        let returns = prices.returns()?;
        let expected = ReturnsEstimator::new(self.config.returns_config())?
            .estimate_from_returns(&returns)?;
        let covariance = SampleCovarianceEstimator::new(self.config.covariance_config())?
            .estimate_series(&returns)?;
        Ok((expected, covariance))
    }

    /// Maximum-Sharpe allocation.
    ///
    /// # Errors
    /// Estimation errors, [`hobart_optim::OptimError::NoExcessReturn`] and
    /// solver errors.
    #[instrument(skip_all, fields(assets = prices.n_assets(), observations = prices.n_periods()))]
    pub fn try_max_sharpe(&self, prices: &PriceMatrix) -> Result<Allocation, EngineError> {
        let (expected, covariance) = self.estimate(prices)?;
        Ok(self.optimizer().max_sharpe(&expected, &covariance)?)
    }

    /// Minimum-volatility allocation.
    ///
    /// # Errors
    /// Estimation and solver errors.
    #[instrument(skip_all, fields(assets = prices.n_assets(), observations = prices.n_periods()))]
    pub fn try_min_volatility(&self, prices: &PriceMatrix) -> Result<Allocation, EngineError> {
        let (expected, covariance) = self.estimate(prices)?;
        Ok(self.optimizer().min_volatility(&expected, &covariance)?)
    }

    /// Hierarchical risk parity allocation.
    ///
    /// # Errors
    /// Insufficient data with fewer than two assets or two returns, singular
    /// covariance when an asset never moves.
    #[instrument(skip_all, fields(assets = prices.n_assets(), observations = prices.n_periods()))]
    pub fn try_hrp(&self, prices: &PriceMatrix) -> Result<HrpAllocation, EngineError> {
        let returns = prices.returns()?;
        Ok(HierarchicalRiskParity::new(self.config.hrp_config()).allocate(&returns)?)
    }

    /// Allocation by `method`, without HRP clustering detail.
    ///
    /// # Errors
    /// Errors of the selected method.
    pub fn try_allocate(
        &self,
        method: AllocationMethod,
        prices: &PriceMatrix,
    ) -> Result<Allocation, EngineError> {
        match method {
            AllocationMethod::MaxSharpe => self.try_max_sharpe(prices),
            AllocationMethod::MinVolatility => self.try_min_volatility(prices),
            AllocationMethod::Hrp => self.try_hrp(prices).map(|hrp| Allocation {
                weights: hrp.weights,
                performance: hrp.performance,
            }),
        }
    }

    /// Efficient frontier with its reference portfolios.
    ///
    /// # Errors
    /// Estimation errors, errors of the max-Sharpe and min-volatility solves,
    /// and [`hobart_optim::OptimError::NoFeasibleFrontierPoints`].
    #[instrument(skip_all, fields(
        assets = prices.n_assets(),
        observations = prices.n_periods(),
        points = self.config.frontier_points,
    ))]
    pub fn try_efficient_frontier(
        &self,
        prices: &PriceMatrix,
    ) -> Result<FrontierResult, EngineError> {
        let (expected, covariance) = self.estimate(prices)?;
        let frontier = EfficientFrontier::new(self.optimizer(), self.config.frontier_points)?;
        Ok(frontier.sample(&expected, &covariance)?)
    }

    /// Statistics of fixed `weights` over `prices`.
    ///
    /// # Errors
    /// Estimation errors, and a mismatch when `weights` is not labelled with
    /// the tickers of `prices` in order.
    pub fn try_portfolio_performance(
        &self,
        prices: &PriceMatrix,
        weights: &WeightVector,
    ) -> Result<PerformanceStats, EngineError> {
        let (expected, covariance) = self.estimate(prices)?;
        Ok(self
            .optimizer()
            .portfolio_performance(weights, &expected, &covariance)?)
    }

    /// Backtest fixed `weights` against `benchmark`.
    ///
    /// # Errors
    /// Insufficient data with fewer than two prices on either side, data
    /// alignment when the two share no return date.
    #[instrument(skip_all, fields(
        assets = prices.n_assets(),
        observations = prices.n_periods(),
        benchmark = benchmark.ticker(),
    ))]
    pub fn try_backtest(
        &self,
        prices: &PriceMatrix,
        weights: &WeightVector,
        benchmark: &PriceSeries,
    ) -> Result<BacktestReport, EngineError> {
        let report =
            PerformanceEvaluator::new(self.config.frequency).evaluate(prices, weights, benchmark)?;
        info!(
            periods = report.summary.periods,
            excess = report.summary.excess_return,
            "backtest complete"
        );
        Ok(report)
    }

    /// Maximum-Sharpe allocation report.
    pub fn max_sharpe(&self, prices: &PriceMatrix) -> Outcome<AllocationReport> {
        self.allocate(AllocationMethod::MaxSharpe, prices)
    }

    /// Minimum-volatility allocation report.
    pub fn min_volatility(&self, prices: &PriceMatrix) -> Outcome<AllocationReport> {
        self.allocate(AllocationMethod::MinVolatility, prices)
    }

    /// HRP allocation report including the cluster ordering.
    pub fn hrp(&self, prices: &PriceMatrix) -> Outcome<AllocationReport> {
        self.allocate(AllocationMethod::Hrp, prices)
    }

    /// Allocation report by `method`.
    pub fn allocate(
        &self,
        method: AllocationMethod,
        prices: &PriceMatrix,
    ) -> Outcome<AllocationReport> {
        let report = match method {
            AllocationMethod::Hrp => self
                .try_hrp(prices)
                .map(|hrp| AllocationReport::from_hrp(&hrp)),
            _ => self.try_allocate(method, prices).map(|allocation| {
                AllocationReport::from_allocation(method.to_string(), &allocation)
            }),
        };
        report.into()
    }

    /// Frontier report.
    pub fn efficient_frontier(&self, prices: &PriceMatrix) -> Outcome<FrontierReport> {
        self.try_efficient_frontier(prices)
            .map(|result| FrontierReport::from(&result))
            .into()
    }

    /// Formatted statistics of fixed `weights`.
    pub fn portfolio_performance(
        &self,
        prices: &PriceMatrix,
        weights: &WeightVector,
    ) -> Outcome<FormattedPerformance> {
        self.try_portfolio_performance(prices, weights)
            .map(|stats| FormattedPerformance::from(&stats))
            .into()
    }

    /// Backtest report.
    pub fn backtest(
        &self,
        prices: &PriceMatrix,
        weights: &WeightVector,
        benchmark: &PriceSeries,
    ) -> Outcome<BacktestReport> {
        self.try_backtest(prices, weights, benchmark).into()
    }
}
