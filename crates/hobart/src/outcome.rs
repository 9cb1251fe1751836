//! Tagged results returned across the engine boundary.

use crate::error::{EngineError, ErrorKind};
use serde::Serialize;

/// Result of an engine operation.
///
/// Serializes as `{"status": "success", ...payload}` or
/// `{"status": "error", "kind": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome<T> {
    /// The operation succeeded
    Success(T),
    /// The operation failed
    Error {
        /// Error classification
        kind: ErrorKind,
        /// Human-readable description
        message: String,
    },
}

impl<T> Outcome<T> {
    /// Whether this is a success.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The payload, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Error { .. } => None,
        }
    }

    /// The error kind, if any.
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Error { kind, .. } => Some(*kind),
        }
    }

    /// Transform the payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Error { kind, message } => Outcome::Error { kind, message },
        }
    }
}

impl<T> From<Result<T, EngineError>> for Outcome<T> {
    fn from(result: Result<T, EngineError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Error {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}
