#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod prices;
pub mod returns;

pub use error::{DataError, ErrorKind, Result};
pub use loader::{parse_price_csv, read_price_csv, read_price_series_csv};
pub use prices::{PriceMatrix, PriceSeries};
pub use returns::ReturnSeries;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
