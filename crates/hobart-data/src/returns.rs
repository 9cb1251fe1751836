//! Simple return series.

use crate::error::{DataError, Result};
use crate::prices::{PriceMatrix, check_increasing};
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, Axis};

/// Per-asset simple returns, one row per period.
///
/// Row `t` holds `p[t + 1] / p[t] - 1` of the source prices and is dated with
/// the later of the two price dates.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    values: Array2<f64>,
}

impl ReturnSeries {
    /// Create a return series directly from values.
    ///
    /// # Errors
    /// Returns an error if the shape disagrees with the labels, dates are not
    /// strictly increasing or a value is not finite.
    pub fn new(dates: Vec<NaiveDate>, tickers: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.dim() != (dates.len(), tickers.len()) {
            return Err(DataError::DimensionMismatch {
                expected: format!("{} x {}", dates.len(), tickers.len()),
                actual: format!("{} x {}", values.nrows(), values.ncols()),
            });
        }
        check_increasing(&dates)?;
        if let Some(((row, col), value)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(DataError::Parse(format!(
                "non-finite return {value} for {} on {}",
                tickers[col], dates[row]
            )));
        }

        Ok(Self {
            dates,
            tickers,
            values,
        })
    }

    /// Compute simple returns from prices.
    ///
    /// # Errors
    /// Returns [`DataError::InsufficientData`] with fewer than two price rows.
    pub fn from_prices(prices: &PriceMatrix) -> Result<Self> {
        let n_rows = prices.n_periods();
        if n_rows < 2 {
            return Err(DataError::InsufficientData {
                what: "price rows",
                required: 2,
                actual: n_rows,
            });
        }

        let values = prices.values();
        let previous = values.slice(ndarray::s![..-1, ..]);
        let current = values.slice(ndarray::s![1.., ..]);
        let returns = &current / &previous - 1.0;

        Ok(Self {
            dates: prices.dates()[1..].to_vec(),
            tickers: prices.tickers().to_vec(),
            values: returns,
        })
    }

    /// Period dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column tickers.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Return values, one row per period.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of return periods.
    pub fn n_periods(&self) -> usize {
        self.values.nrows()
    }

    /// Number of assets.
    pub fn n_assets(&self) -> usize {
        self.values.ncols()
    }

    /// Returns of one asset by column position.
    pub fn column(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.values.index_axis(Axis(1), idx)
    }
}
