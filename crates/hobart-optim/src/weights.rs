//! Weight vectors and per-asset bounds.

use crate::error::OptimError;
use ndarray::Array1;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Default cleaning cutoff for small weights.
pub const DEFAULT_CLEANING_THRESHOLD: f64 = 1e-4;

/// Tolerance on the sum of weights and on bound feasibility.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Per-asset weight bounds.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightBounds {
    /// Same interval for every asset
    Uniform {
        /// Lower bound
        lower: f64,
        /// Upper bound
        upper: f64,
    },
    /// One `(lower, upper)` interval per asset, in ticker order
    PerAsset(Vec<(f64, f64)>),
}

impl Default for WeightBounds {
    /// Long-only, fully invested: `[0, 1]` per asset.
    fn default() -> Self {
        Self::Uniform {
            lower: 0.0,
            upper: 1.0,
        }
    }
}

impl WeightBounds {
    /// Uniform bounds
    pub const fn uniform(lower: f64, upper: f64) -> Self {
        Self::Uniform { lower, upper }
    }

    /// Expand to lower and upper vectors for `n` assets.
    ///
    /// # Errors
    /// Fails when an interval is empty or not a number, when the per-asset
    /// list has the wrong length, or when no weights within the bounds can sum
    /// to one.
    pub fn resolve(&self, n: usize) -> Result<(Vec<f64>, Vec<f64>), OptimError> {
        let (lower, upper): (Vec<f64>, Vec<f64>) = match self {
            Self::Uniform { lower, upper } => (vec![*lower; n], vec![*upper; n]),
            Self::PerAsset(bounds) => {
                if bounds.len() != n {
                    return Err(OptimError::Mismatch(format!(
                        "{} weight bounds for {n} assets",
                        bounds.len()
                    )));
                }
                bounds.iter().copied().unzip()
            }
        };

        for (i, (lo, hi)) in lower.iter().zip(&upper).enumerate() {
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(OptimError::InfeasibleBounds(format!(
                    "asset {i} has bounds [{lo}, {hi}]"
                )));
            }
        }

        let min_sum: f64 = lower.iter().sum();
        let max_sum: f64 = upper.iter().sum();
        if min_sum > 1.0 + WEIGHT_SUM_TOLERANCE || max_sum < 1.0 - WEIGHT_SUM_TOLERANCE {
            return Err(OptimError::InfeasibleBounds(format!(
                "weights can sum to between {min_sum} and {max_sum}, which excludes 1"
            )));
        }

        Ok((lower, upper))
    }

    /// Whether every lower bound is non-negative.
    pub fn is_long_only(&self) -> bool {
        match self {
            Self::Uniform { lower, .. } => *lower >= 0.0,
            Self::PerAsset(bounds) => bounds.iter().all(|(lo, _)| *lo >= 0.0),
        }
    }
}

/// Portfolio weights labelled by ticker.
///
/// Serializes as a JSON object in ticker order.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    tickers: Vec<String>,
    weights: Array1<f64>,
}

impl WeightVector {
    /// Create a weight vector.
    ///
    /// # Errors
    /// Fails if the lengths differ or a weight is not finite.
    pub fn new(tickers: Vec<String>, weights: Array1<f64>) -> Result<Self, OptimError> {
        if tickers.len() != weights.len() {
            return Err(OptimError::Mismatch(format!(
                "{} tickers for {} weights",
                tickers.len(),
                weights.len()
            )));
        }
        if let Some(idx) = weights.iter().position(|w| !w.is_finite()) {
            return Err(OptimError::InvalidParameter(format!(
                "weight for {} is not finite",
                tickers[idx]
            )));
        }
        Ok(Self { tickers, weights })
    }

    /// Lay a ticker → weight map out over `tickers`.
    ///
    /// Tickers missing from the map get weight zero; map entries naming other
    /// tickers are ignored.
    ///
    /// # Errors
    /// Fails if a weight is not finite.
    pub fn from_map(tickers: &[String], map: &BTreeMap<String, f64>) -> Result<Self, OptimError> {
        for name in map.keys().filter(|name| !tickers.contains(name)) {
            warn!(ticker = %name, "ignoring weight for ticker absent from prices");
        }
        let weights = tickers
            .iter()
            .map(|t| map.get(t).copied().unwrap_or(0.0))
            .collect();
        Self::new(tickers.to_vec(), weights)
    }

    /// Asset tickers.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Raw weights, aligned with [`tickers`](Self::tickers).
    pub const fn values(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Weight of a single ticker.
    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map(|idx| self.weights[idx])
    }

    /// `(ticker, weight)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.tickers
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    /// Whether there are no assets.
    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Sum of weights.
    pub fn sum(&self) -> f64 {
        self.weights.sum()
    }

    /// Zero out weights whose magnitude is below `threshold` and rescale the
    /// rest to sum to one.
    ///
    /// Left unchanged if nothing would survive.
    #[must_use]
    pub fn clean(&self, threshold: f64) -> Self {
        let cleaned = self
            .weights
            .mapv(|w| if w.abs() < threshold { 0.0 } else { w });
        let total = cleaned.sum();
        if total.abs() <= f64::EPSILON {
            return self.clone();
        }
        Self {
            tickers: self.tickers.clone(),
            weights: cleaned / total,
        }
    }

    /// Copy rounded to `decimals` places.
    #[must_use]
    pub fn rounded(&self, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        Self {
            tickers: self.tickers.clone(),
            weights: self.weights.mapv(|w| (w * scale).round() / scale),
        }
    }
}

impl Serialize for WeightVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (ticker, weight) in self.iter() {
            map.serialize_entry(ticker, &weight)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WeightVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, f64>::deserialize(deserializer)?;
        let (tickers, weights): (Vec<String>, Vec<f64>) = map.into_iter().unzip();
        Self::new(tickers, Array1::from(weights)).map_err(serde::de::Error::custom)
    }
}
