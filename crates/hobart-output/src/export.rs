//! CSV and JSON export of weights, frontier points and backtest records.

use crate::backtest::{BacktestRecord, BacktestReport};
use crate::report::{AllocationReport, FrontierReport};
use hobart_data::ErrorKind;
use hobart_optim::{FrontierCurve, WeightVector};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl ExportError {
    /// Classify the error.
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Guess the format from a file extension, defaulting to pretty JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::PrettyJson,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// One row of a weights table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightRecord<'a> {
    /// Ticker
    pub ticker: &'a str,
    /// Weight
    pub weight: f64,
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Serialize rows through a CSV writer with a header.
fn to_csv<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, ExportError> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

impl Exporter for WeightVector {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv(
                self.iter()
                    .map(|(ticker, weight)| WeightRecord { ticker, weight }),
            ),
            ExportFormat::Json => to_json(self, false),
            ExportFormat::PrettyJson => to_json(self, true),
        }
    }
}

impl Exporter for AllocationReport {
    /// CSV holds the weights table only.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => self.weights.export_to_string(format),
            ExportFormat::Json => to_json(self, false),
            ExportFormat::PrettyJson => to_json(self, true),
        }
    }
}

impl Exporter for FrontierCurve {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv(self.points()),
            ExportFormat::Json => to_json(self, false),
            ExportFormat::PrettyJson => to_json(self, true),
        }
    }
}

impl Exporter for FrontierReport {
    /// CSV holds the frontier points only.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => self.frontier.export_to_string(format),
            ExportFormat::Json => to_json(self, false),
            ExportFormat::PrettyJson => to_json(self, true),
        }
    }
}

impl Exporter for [BacktestRecord] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv(self),
            ExportFormat::Json => to_json(self, false),
            ExportFormat::PrettyJson => to_json(self, true),
        }
    }
}

impl Exporter for BacktestReport {
    /// CSV holds the dated records only.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => self.records.export_to_string(format),
            ExportFormat::Json => to_json(self, false),
            ExportFormat::PrettyJson => to_json(self, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use hobart_optim::FrontierPoint;
    use ndarray::Array1;

    fn weights() -> WeightVector {
        WeightVector::new(
            vec!["AAPL".to_string(), "MSFT".to_string()],
            Array1::from(vec![0.4, 0.6]),
        )
        .unwrap()
    }

    #[test]
    fn test_weights_csv() {
        let csv = weights().export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["ticker,weight", "AAPL,0.4", "MSFT,0.6"]);
    }

    #[test]
    fn test_weights_json() {
        let json = weights().export_to_string(ExportFormat::Json).unwrap();
        assert_eq!(json, r#"{"AAPL":0.4,"MSFT":0.6}"#);

        let pretty = weights().export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(pretty.contains("  ")); // Indentation indicates pretty format
    }

    #[test]
    fn test_frontier_csv_header() {
        let curve = FrontierCurve::new(vec![FrontierPoint {
            risk: 0.1,
            expected_return: 0.05,
        }]);
        let csv = curve.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("risk,return\n"));
        assert!(csv.contains("0.1,0.05"));
    }

    #[test]
    fn test_backtest_records_csv() {
        let records = vec![BacktestRecord {
            date: NaiveDate::from_ymd_opt(2020, 1, 3).unwrap(),
            portfolio_cumulative_return: 0.01,
            benchmark_cumulative_return: -0.02,
        }];
        let csv = records.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("date,portfolio_cumulative_return,benchmark_cumulative_return"));
        assert!(csv.contains("2020-01-03,0.01,-0.02"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(
            ExportFormat::from_path(Path::new("out/weights.csv")),
            ExportFormat::Csv
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("frontier.json")),
            ExportFormat::PrettyJson
        );
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Json.extension(), "json");
    }
}
