//! Price matrices and single-ticker price series.
//!
//! A [`PriceMatrix`] is the engine's only market-data input: rows are dates in
//! strictly increasing order, columns are tickers, and every entry is a
//! finite, strictly positive price. Gaps must be filled before a matrix can be
//! built; [`PriceMatrix::from_series`] does this with a forward fill followed by
//! a backward fill, the same rule the CSV loader applies.

use crate::error::{DataError, Result};
use crate::returns::ReturnSeries;
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, Axis};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Dates × tickers matrix of prices.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    values: Array2<f64>,
}

impl PriceMatrix {
    /// Create a price matrix from its labels and a `(dates, tickers)` shaped array.
    ///
    /// # Errors
    /// Returns an error if the shape disagrees with the labels, a ticker is
    /// repeated, dates are not strictly increasing, or any price is not a
    /// finite positive number.
    pub fn new(dates: Vec<NaiveDate>, tickers: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.dim() != (dates.len(), tickers.len()) {
            return Err(DataError::DimensionMismatch {
                expected: format!("{} x {}", dates.len(), tickers.len()),
                actual: format!("{} x {}", values.nrows(), values.ncols()),
            });
        }
        check_unique_tickers(&tickers)?;
        check_increasing(&dates)?;

        for ((row, col), &price) in values.indexed_iter() {
            if !price.is_finite() || price <= 0.0 {
                return Err(DataError::InvalidPrice {
                    ticker: tickers[col].clone(),
                    date: dates[row],
                    price,
                });
            }
        }

        Ok(Self {
            dates,
            tickers,
            values,
        })
    }

    /// Build a matrix from per-ticker series aligned on the union of their dates.
    ///
    /// Dates a ticker has no price for are forward-filled from its previous
    /// price, and any leading gap is back-filled from its first price.
    ///
    /// # Errors
    /// Returns an error if no series are given or a ticker appears twice.
    pub fn from_series(series: Vec<PriceSeries>) -> Result<Self> {
        if series.is_empty() {
            return Err(DataError::InsufficientData {
                what: "tickers",
                required: 1,
                actual: 0,
            });
        }

        let all_dates: BTreeSet<NaiveDate> = series
            .iter()
            .flat_map(|s| s.dates.iter().copied())
            .collect();
        let dates: Vec<NaiveDate> = all_dates.into_iter().collect();
        let tickers: Vec<String> = series.iter().map(|s| s.ticker.clone()).collect();
        check_unique_tickers(&tickers)?;

        let mut values = Array2::<f64>::zeros((dates.len(), tickers.len()));
        for (col, s) in series.iter().enumerate() {
            let by_date: BTreeMap<NaiveDate, f64> =
                s.dates.iter().copied().zip(s.prices.iter().copied()).collect();
            let mut column: Vec<Option<f64>> =
                dates.iter().map(|d| by_date.get(d).copied()).collect();
            let filled = fill_gaps(&s.ticker, &mut column)?;
            for (row, price) in filled.into_iter().enumerate() {
                values[[row, col]] = price;
            }
        }

        Self::new(dates, tickers, values)
    }

    /// Row dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column tickers.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Raw price values, one row per date.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of dates.
    pub fn n_periods(&self) -> usize {
        self.dates.len()
    }

    /// Number of tickers.
    pub fn n_assets(&self) -> usize {
        self.tickers.len()
    }

    /// Column position of a ticker.
    pub fn ticker_index(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    /// Price column of a ticker.
    pub fn column(&self, ticker: &str) -> Option<ArrayView1<'_, f64>> {
        self.ticker_index(ticker)
            .map(|idx| self.values.index_axis(Axis(1), idx))
    }

    /// Extract a single ticker as a [`PriceSeries`].
    ///
    /// # Errors
    /// Returns [`DataError::UnknownTicker`] if the ticker is not a column.
    pub fn series(&self, ticker: &str) -> Result<PriceSeries> {
        let column = self
            .column(ticker)
            .ok_or_else(|| DataError::UnknownTicker(ticker.to_string()))?;
        Ok(PriceSeries {
            ticker: ticker.to_string(),
            dates: self.dates.clone(),
            prices: column.to_vec(),
        })
    }

    /// Restrict the matrix to the given tickers, in the given order.
    ///
    /// # Errors
    /// Returns an error if any ticker is unknown or repeated.
    pub fn select<S: AsRef<str>>(&self, tickers: &[S]) -> Result<Self> {
        let indices = tickers
            .iter()
            .map(|t| {
                self.ticker_index(t.as_ref())
                    .ok_or_else(|| DataError::UnknownTicker(t.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        let selected: Vec<String> = tickers.iter().map(|t| t.as_ref().to_string()).collect();
        check_unique_tickers(&selected)?;

        Ok(Self {
            dates: self.dates.clone(),
            tickers: selected,
            values: self.values.select(Axis(1), &indices),
        })
    }

    /// Simple period-over-period returns.
    ///
    /// # Errors
    /// Returns [`DataError::InsufficientData`] with fewer than two rows.
    pub fn returns(&self) -> Result<ReturnSeries> {
        ReturnSeries::from_prices(self)
    }
}

/// Dated prices for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Create a price series.
    ///
    /// # Errors
    /// Returns an error if lengths differ, dates are not strictly increasing or
    /// a price is not a finite positive number.
    pub fn new(ticker: impl Into<String>, dates: Vec<NaiveDate>, prices: Vec<f64>) -> Result<Self> {
        let ticker = ticker.into();
        if dates.len() != prices.len() {
            return Err(DataError::DimensionMismatch {
                expected: format!("{} prices", dates.len()),
                actual: format!("{} prices", prices.len()),
            });
        }
        check_increasing(&dates)?;
        if let Some((date, &price)) = dates
            .iter()
            .zip(prices.iter())
            .find(|(_, p)| !p.is_finite() || **p <= 0.0)
        {
            return Err(DataError::InvalidPrice {
                ticker,
                date: *date,
                price,
            });
        }

        Ok(Self {
            ticker,
            dates,
            prices,
        })
    }

    /// Build a series from `(date, price)` pairs in date order.
    ///
    /// # Errors
    /// Same conditions as [`PriceSeries::new`].
    pub fn from_pairs(
        ticker: impl Into<String>,
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self> {
        let (dates, prices) = pairs.into_iter().unzip();
        Self::new(ticker, dates, prices)
    }

    /// Ticker symbol.
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Observation dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Prices, aligned with [`dates`](Self::dates).
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Single-column matrix view of this series.
    ///
    /// # Errors
    /// Never fails for a series built through [`PriceSeries::new`].
    pub fn to_matrix(&self) -> Result<PriceMatrix> {
        let values = Array2::from_shape_vec((self.prices.len(), 1), self.prices.clone())
            .map_err(|e| DataError::Parse(e.to_string()))?;
        PriceMatrix::new(self.dates.clone(), vec![self.ticker.clone()], values)
    }

    /// Simple period-over-period returns of this series.
    ///
    /// # Errors
    /// Returns [`DataError::InsufficientData`] with fewer than two prices.
    pub fn returns(&self) -> Result<ReturnSeries> {
        self.to_matrix()?.returns()
    }
}

/// Forward-fill then back-fill a column with gaps.
pub(crate) fn fill_gaps(ticker: &str, column: &mut [Option<f64>]) -> Result<Vec<f64>> {
    let Some(first_seen) = column.iter().flatten().next().copied() else {
        return Err(DataError::MissingData {
            ticker: ticker.to_string(),
            reason: "no prices in range".to_string(),
        });
    };

    let mut last = None;
    for cell in column.iter_mut() {
        match cell {
            Some(v) => last = Some(*v),
            None => *cell = last,
        }
    }

    Ok(column.iter().map(|c| c.unwrap_or(first_seen)).collect())
}

fn check_unique_tickers(tickers: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(tickers.len());
    for ticker in tickers {
        if !seen.insert(ticker.as_str()) {
            return Err(DataError::DuplicateTicker(ticker.clone()));
        }
    }
    Ok(())
}

pub(crate) fn check_increasing(dates: &[NaiveDate]) -> Result<()> {
    for pair in dates.windows(2) {
        if pair[1] <= pair[0] {
            if pair[1] == pair[0] {
                return Err(DataError::DuplicateDate(pair[0]));
            }
            return Err(DataError::NonIncreasingDates {
                previous: pair[0],
                current: pair[1],
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample_matrix() -> PriceMatrix {
        PriceMatrix::new(
            vec![date(1), date(2), date(3)],
            vec!["AAA".to_string(), "BBB".to_string()],
            Array2::from_shape_vec((3, 2), vec![10.0, 20.0, 11.0, 19.0, 12.1, 19.0]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_validates_shape() {
        let result = PriceMatrix::new(
            vec![date(1), date(2)],
            vec!["AAA".to_string()],
            Array2::zeros((3, 1)),
        );
        assert!(matches!(result, Err(DataError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_new_rejects_non_positive_price() {
        let result = PriceMatrix::new(
            vec![date(1), date(2)],
            vec!["AAA".to_string()],
            Array2::from_shape_vec((2, 1), vec![1.0, 0.0]).unwrap(),
        );
        assert!(matches!(result, Err(DataError::InvalidPrice { .. })));
    }

    #[test]
    fn test_new_rejects_unsorted_dates() {
        let result = PriceMatrix::new(
            vec![date(2), date(1)],
            vec!["AAA".to_string()],
            Array2::from_elem((2, 1), 1.0),
        );
        assert!(matches!(
            result,
            Err(DataError::NonIncreasingDates { .. })
        ));
    }

    #[test]
    fn test_new_rejects_duplicate_ticker() {
        let result = PriceMatrix::new(
            vec![date(1)],
            vec!["AAA".to_string(), "AAA".to_string()],
            Array2::from_elem((1, 2), 1.0),
        );
        assert!(matches!(result, Err(DataError::DuplicateTicker(_))));
    }

    #[test]
    fn test_select_reorders_columns() {
        let prices = sample_matrix();
        let selected = prices.select(&["BBB", "AAA"]).unwrap();
        assert_eq!(selected.tickers(), &["BBB".to_string(), "AAA".to_string()]);
        assert_relative_eq!(selected.values()[[0, 0]], 20.0);
        assert!(prices.select(&["ZZZ"]).is_err());
    }

    #[test]
    fn test_from_series_fills_gaps() {
        let a = PriceSeries::new("AAA", vec![date(1), date(2), date(3)], vec![1.0, 2.0, 3.0])
            .unwrap();
        let b = PriceSeries::new("BBB", vec![date(2)], vec![5.0]).unwrap();

        let prices = PriceMatrix::from_series(vec![a, b]).unwrap();
        assert_eq!(prices.n_periods(), 3);

        let column = prices.column("BBB").unwrap();
        // Back-filled on day 1, forward-filled on day 3
        assert_relative_eq!(column[0], 5.0);
        assert_relative_eq!(column[1], 5.0);
        assert_relative_eq!(column[2], 5.0);
    }

    #[test]
    fn test_fill_gaps_empty_column() {
        let mut column = vec![None, None];
        assert!(matches!(
            fill_gaps("AAA", &mut column),
            Err(DataError::MissingData { .. })
        ));
    }

    #[test]
    fn test_series_round_trip() {
        let prices = sample_matrix();
        let series = prices.series("AAA").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.ticker(), "AAA");

        let matrix = series.to_matrix().unwrap();
        assert_eq!(matrix.n_assets(), 1);
        assert_eq!(matrix.dates(), prices.dates());
    }
}
