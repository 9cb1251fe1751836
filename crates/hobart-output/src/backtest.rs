//! Historical performance of a fixed-weight portfolio against a benchmark.

use chrono::NaiveDate;
use hobart_data::{DataError, ErrorKind, PriceMatrix, PriceSeries};
use hobart_optim::{OptimError, WeightVector};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::info;

/// Errors raised while evaluating a backtest.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// Too few prices in an input
    #[error("Insufficient data: need at least {required} {what}, got {actual}")]
    InsufficientData {
        /// Which input was short
        what: &'static str,
        /// Required count
        required: usize,
        /// Actual count
        actual: usize,
    },

    /// Portfolio and benchmark share no dates
    #[error("No overlapping dates: {0}")]
    DataAlignment(String),

    /// Weights could not be laid out over the prices
    #[error(transparent)]
    Weights(#[from] OptimError),

    /// Price data error
    #[error(transparent)]
    Data(#[from] DataError),
}

impl BacktestError {
    /// Classify the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientData { .. } => ErrorKind::InsufficientData,
            Self::DataAlignment(_) => ErrorKind::DataAlignment,
            Self::Weights(err) => err.kind(),
            Self::Data(err) => err.kind(),
        }
    }
}

/// Cumulative return path `Π(1 + r) - 1` after each period.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |growth, r| {
            *growth *= 1.0 + r;
            Some(*growth - 1.0)
        })
        .collect()
}

/// One aligned date of the backtest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestRecord {
    /// Date
    pub date: NaiveDate,
    /// Portfolio return since its first period
    pub portfolio_cumulative_return: f64,
    /// Benchmark return since its first period
    pub benchmark_cumulative_return: f64,
}

/// Headline numbers over the aligned dates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    /// First aligned date
    pub start: NaiveDate,
    /// Last aligned date
    pub end: NaiveDate,
    /// Number of aligned dates
    pub periods: usize,
    /// Portfolio cumulative return at the last aligned date
    pub portfolio_total_return: f64,
    /// Benchmark cumulative return at the last aligned date
    pub benchmark_total_return: f64,
    /// Portfolio minus benchmark total return
    pub excess_return: f64,
    /// Annualized volatility of portfolio period returns
    pub portfolio_volatility: f64,
    /// Annualized volatility of benchmark period returns
    pub benchmark_volatility: f64,
}

/// Aligned cumulative returns and their summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Benchmark ticker
    pub benchmark: String,
    /// Records in date order
    pub records: Vec<BacktestRecord>,
    /// Summary statistics
    pub summary: BacktestSummary,
}

impl fmt::Display for BacktestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        writeln!(f, "Backtest {} to {} ({} periods)", s.start, s.end, s.periods)?;
        writeln!(
            f,
            "  Portfolio: {:>8.2}% total, {:>6.2}% volatility",
            s.portfolio_total_return * 100.0,
            s.portfolio_volatility * 100.0
        )?;
        writeln!(
            f,
            "  {:<9}: {:>8.2}% total, {:>6.2}% volatility",
            self.benchmark,
            s.benchmark_total_return * 100.0,
            s.benchmark_volatility * 100.0
        )?;
        write!(f, "  Excess:    {:>8.2}%", s.excess_return * 100.0)
    }
}

/// Evaluates fixed weights over historical prices.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceEvaluator {
    frequency: usize,
}

impl Default for PerformanceEvaluator {
    fn default() -> Self {
        Self { frequency: 252 }
    }
}

impl PerformanceEvaluator {
    /// Evaluator annualizing volatility with `frequency` periods per year.
    pub const fn new(frequency: usize) -> Self {
        Self { frequency }
    }

    /// Run the backtest.
    ///
    /// Tickers of `prices` absent from `weights` are held at zero.
    ///
    /// # Errors
    /// [`BacktestError::InsufficientData`] when either input has fewer than
    /// two prices, [`BacktestError::DataAlignment`] when the two return series
    /// share no date.
    pub fn evaluate(
        &self,
        prices: &PriceMatrix,
        weights: &WeightVector,
        benchmark: &PriceSeries,
    ) -> Result<BacktestReport, BacktestError> {
        if prices.n_periods() < 2 {
            return Err(BacktestError::InsufficientData {
                what: "portfolio price rows",
                required: 2,
                actual: prices.n_periods(),
            });
        }
        if benchmark.len() < 2 {
            return Err(BacktestError::InsufficientData {
                what: "benchmark prices",
                required: 2,
                actual: benchmark.len(),
            });
        }

        let map: BTreeMap<String, f64> = weights
            .iter()
            .map(|(ticker, w)| (ticker.to_string(), w))
            .collect();
        let aligned = WeightVector::from_map(prices.tickers(), &map)?;

        let asset_returns = prices.returns()?;
        let portfolio_returns = asset_returns.values().dot(aligned.values()).to_vec();
        let benchmark_series = benchmark.returns()?;
        let benchmark_returns = benchmark_series.column(0).to_vec();

        let pairs = intersect_dates(asset_returns.dates(), benchmark_series.dates());
        if pairs.is_empty() {
            let (p_start, p_end) = date_span(asset_returns.dates());
            let (b_start, b_end) = date_span(benchmark_series.dates());
            return Err(BacktestError::DataAlignment(format!(
                "portfolio returns cover {p_start} to {p_end}, benchmark {} covers {b_start} to {b_end}",
                benchmark.ticker(),
            )));
        }

        let portfolio_cum = cumulative_returns(&portfolio_returns);
        let benchmark_cum = cumulative_returns(&benchmark_returns);
        let records: Vec<BacktestRecord> = pairs
            .iter()
            .map(|&(date, i, j)| BacktestRecord {
                date,
                portfolio_cumulative_return: portfolio_cum[i],
                benchmark_cumulative_return: benchmark_cum[j],
            })
            .collect();

        let aligned_portfolio: Vec<f64> =
            pairs.iter().map(|&(_, i, _)| portfolio_returns[i]).collect();
        let aligned_benchmark: Vec<f64> =
            pairs.iter().map(|&(_, _, j)| benchmark_returns[j]).collect();

        let first = records[0];
        let last = records[records.len() - 1];
        let summary = BacktestSummary {
            start: first.date,
            end: last.date,
            periods: records.len(),
            portfolio_total_return: last.portfolio_cumulative_return,
            benchmark_total_return: last.benchmark_cumulative_return,
            excess_return: last.portfolio_cumulative_return - last.benchmark_cumulative_return,
            portfolio_volatility: self.annualized_volatility(&aligned_portfolio),
            benchmark_volatility: self.annualized_volatility(&aligned_benchmark),
        };

        info!(
            periods = summary.periods,
            portfolio = summary.portfolio_total_return,
            benchmark = summary.benchmark_total_return,
            "backtest complete"
        );
        Ok(BacktestReport {
            benchmark: benchmark.ticker().to_string(),
            records,
            summary,
        })
    }

    /// Sample standard deviation scaled by `sqrt(frequency)`; zero for fewer
    /// than two observations.
    fn annualized_volatility(&self, returns: &[f64]) -> f64 {
        let n = returns.len();
        if n < 2 {
            return 0.0;
        }
        let mean = returns.iter().sum::<f64>() / n as f64;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        (variance * self.frequency as f64).sqrt()
    }
}

/// Merge-join of two sorted date lists, yielding `(date, index_a, index_b)`.
fn intersect_dates(a: &[NaiveDate], b: &[NaiveDate]) -> Vec<(NaiveDate, usize, usize)> {
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::new();
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push((a[i], i, j));
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn date_span(dates: &[NaiveDate]) -> (String, String) {
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => (first.to_string(), last.to_string()),
        _ => ("-".to_string(), "-".to_string()),
    }
}
