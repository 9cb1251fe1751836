#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod backtest;
pub mod export;
pub mod report;

pub use backtest::{
    BacktestError, BacktestRecord, BacktestReport, BacktestSummary, PerformanceEvaluator,
    cumulative_returns,
};
pub use export::{ExportError, ExportFormat, Exporter, WeightRecord};
pub use report::{
    AllocationReport, FormattedPerformance, FrontierReport, WEIGHT_DECIMALS, format_percent,
    format_ratio,
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
