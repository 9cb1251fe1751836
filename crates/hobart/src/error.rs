//! Engine-level error type.

pub use hobart_data::ErrorKind;
use hobart_data::DataError;
use hobart_optim::OptimError;
use hobart_output::{BacktestError, ExportError};
use hobart_risk::RiskError;
use std::path::PathBuf;
use thiserror::Error;

/// Any failure surfaced by the [`Engine`](crate::Engine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Price data error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Estimation error
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// Optimization error
    #[error(transparent)]
    Optim(#[from] OptimError),

    /// Backtest error
    #[error(transparent)]
    Backtest(#[from] BacktestError),

    /// Export error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("Failed to read configuration {path}: {source}")]
    ConfigIo {
        /// File that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for [`EngineConfig`](crate::EngineConfig)
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl EngineError {
    /// Classify the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Data(err) => err.kind(),
            Self::Risk(err) => err.kind(),
            Self::Optim(err) => err.kind(),
            Self::Backtest(err) => err.kind(),
            Self::Export(err) => err.kind(),
            Self::Config(_) | Self::ConfigIo { .. } | Self::ConfigParse(_) => {
                ErrorKind::InvalidInput
            }
        }
    }
}
