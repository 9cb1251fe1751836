//! Human-readable output records.
//!
//! Percentages carry two decimals, Sharpe ratios two decimals and weights
//! five decimals.

use hobart_optim::{
    Allocation, FrontierCurve, FrontierResult, HrpAllocation, PerformanceStats, WeightVector,
};
use serde::Serialize;
use std::fmt;

/// Decimal places kept on reported weights.
pub const WEIGHT_DECIMALS: u32 = 5;

/// `0.1234` → `"12.34%"`.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Two-decimal ratio.
pub fn format_ratio(value: f64) -> String {
    format!("{value:.2}")
}

/// Performance statistics formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedPerformance {
    /// e.g. `"12.34%"`
    pub expected_annual_return: String,
    /// e.g. `"18.02%"`
    pub annual_volatility: String,
    /// e.g. `"0.57"`
    pub sharpe_ratio: String,
}

impl From<&PerformanceStats> for FormattedPerformance {
    fn from(stats: &PerformanceStats) -> Self {
        Self {
            expected_annual_return: format_percent(stats.expected_annual_return),
            annual_volatility: format_percent(stats.annual_volatility),
            sharpe_ratio: format_ratio(stats.sharpe_ratio),
        }
    }
}

impl fmt::Display for FormattedPerformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Expected annual return: {:>8}", self.expected_annual_return)?;
        writeln!(f, "  Annual volatility:      {:>8}", self.annual_volatility)?;
        write!(f, "  Sharpe ratio:           {:>8}", self.sharpe_ratio)
    }
}

/// An allocation ready to print or serialize.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationReport {
    /// Method that produced the weights
    pub method: String,
    /// Rounded weights
    pub weights: WeightVector,
    /// Formatted statistics
    pub performance: FormattedPerformance,
    /// Seriated ticker order, for hierarchical allocations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<Vec<String>>,
}

impl AllocationReport {
    /// Report a mean-variance allocation.
    pub fn from_allocation(method: impl Into<String>, allocation: &Allocation) -> Self {
        Self {
            method: method.into(),
            weights: allocation.weights.rounded(WEIGHT_DECIMALS),
            performance: FormattedPerformance::from(&allocation.performance),
            ordering: None,
        }
    }

    /// Report a hierarchical risk parity allocation.
    pub fn from_hrp(allocation: &HrpAllocation) -> Self {
        Self {
            method: "hrp".to_string(),
            weights: allocation.weights.rounded(WEIGHT_DECIMALS),
            performance: FormattedPerformance::from(&allocation.performance),
            ordering: Some(allocation.ordering.clone()),
        }
    }
}

impl fmt::Display for AllocationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Allocation ({})", self.method)?;
        writeln!(f, "  {:<10} {:>10}", "Ticker", "Weight")?;
        for (ticker, weight) in self.weights.iter() {
            writeln!(f, "  {ticker:<10} {weight:>10.5}")?;
        }
        if let Some(ordering) = &self.ordering {
            writeln!(f, "  Cluster order: {}", ordering.join(", "))?;
        }
        write!(f, "{}", self.performance)
    }
}

/// Frontier with its reference portfolios, ready to print or serialize.
#[derive(Debug, Clone, Serialize)]
pub struct FrontierReport {
    /// Parallel risk and return arrays
    pub frontier: FrontierCurve,
    /// Maximum-Sharpe portfolio
    pub max_sharpe: AllocationReport,
    /// Minimum-volatility portfolio
    pub min_volatility: AllocationReport,
    /// Infeasible targets that were skipped
    pub skipped: usize,
}

impl From<&FrontierResult> for FrontierReport {
    fn from(result: &FrontierResult) -> Self {
        Self {
            frontier: result.frontier.clone(),
            max_sharpe: AllocationReport::from_allocation("max_sharpe", &result.max_sharpe),
            min_volatility: AllocationReport::from_allocation(
                "min_volatility",
                &result.min_volatility,
            ),
            skipped: result.skipped,
        }
    }
}

impl fmt::Display for FrontierReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Efficient frontier ({} points, {} skipped)",
            self.frontier.len(),
            self.skipped
        )?;
        writeln!(f, "  {:>10} {:>10}", "Risk", "Return")?;
        for point in self.frontier.points() {
            writeln!(
                f,
                "  {:>10} {:>10}",
                format_percent(point.risk),
                format_percent(point.expected_return)
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.max_sharpe)?;
        writeln!(f)?;
        write!(f, "{}", self.min_volatility)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use rstest::rstest;

    #[rstest]
    #[case(0.123_456, "12.35%")]
    #[case(-0.05, "-5.00%")]
    #[case(0.0, "0.00%")]
    fn test_format_percent(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_percent(value), expected);
    }

    #[test]
    fn test_formatted_performance() {
        let stats = PerformanceStats {
            expected_annual_return: 0.1234,
            annual_volatility: 0.2,
            sharpe_ratio: 0.517,
        };
        let formatted = FormattedPerformance::from(&stats);
        assert_eq!(formatted.expected_annual_return, "12.34%");
        assert_eq!(formatted.annual_volatility, "20.00%");
        assert_eq!(formatted.sharpe_ratio, "0.52");
    }

    #[test]
    fn test_allocation_report_rounds_weights() {
        let weights = WeightVector::new(
            vec!["AAA".to_string(), "BBB".to_string()],
            Array1::from(vec![0.333_333_33, 0.666_666_67]),
        )
        .unwrap();
        let allocation = Allocation {
            weights,
            performance: PerformanceStats {
                expected_annual_return: 0.1,
                annual_volatility: 0.15,
                sharpe_ratio: 0.53,
            },
        };
        let report = AllocationReport::from_allocation("max_sharpe", &allocation);
        assert_eq!(report.weights.get("AAA"), Some(0.33333));

        let text = report.to_string();
        assert!(text.contains("Allocation (max_sharpe)"));
        assert!(text.contains("0.66667"));
        assert!(text.contains("10.00%"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["weights"]["BBB"], serde_json::json!(0.66667));
        assert!(json.get("ordering").is_none());
    }
}
