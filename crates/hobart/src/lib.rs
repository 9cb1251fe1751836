#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;

pub use config::EngineConfig;
pub use engine::{AllocationMethod, Engine};
pub use error::{EngineError, ErrorKind};
pub use outcome::Outcome;

// Re-export subcrates
pub use hobart_data as data;
pub use hobart_optim as optim;
pub use hobart_output as output;
pub use hobart_risk as risk;

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
