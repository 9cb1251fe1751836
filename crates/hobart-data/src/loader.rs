//! CSV price loading.
//!
//! Expects a wide layout with a header row: the first column holds ISO dates
//! (`YYYY-MM-DD`) and every other column holds one ticker's prices. Blank
//! cells are treated as missing and filled per ticker (forward, then
//! backward). Rows may appear in any order; they are sorted by date.

use crate::error::{DataError, Result};
use crate::prices::{PriceMatrix, PriceSeries, fill_gaps};
use chrono::NaiveDate;
use ndarray::Array2;
use std::io::Read;
use std::path::Path;

/// Date format used in price files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Read a wide price CSV from disk.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if the resulting
/// matrix is invalid.
pub fn read_price_csv(path: impl AsRef<Path>) -> Result<PriceMatrix> {
    let file = std::fs::File::open(path.as_ref())?;
    parse_price_csv(file)
}

/// Read a single ticker's prices from a CSV file.
///
/// The file may hold several tickers; only `ticker` is extracted. If the file
/// holds exactly one price column and `ticker` is `None`, that column is used.
///
/// # Errors
/// Returns an error if the file cannot be parsed or the ticker is absent.
pub fn read_price_series_csv(path: impl AsRef<Path>, ticker: Option<&str>) -> Result<PriceSeries> {
    let matrix = read_price_csv(path)?;
    match ticker {
        Some(t) => matrix.series(t),
        None if matrix.n_assets() == 1 => matrix.series(&matrix.tickers()[0]),
        None => Err(DataError::Parse(format!(
            "expected a single price column, found {}",
            matrix.n_assets()
        ))),
    }
}

/// Parse a wide price CSV from any reader.
///
/// # Errors
/// Returns an error on malformed headers, dates or prices, duplicate dates, or
/// a ticker with no prices at all.
pub fn parse_price_csv<R: Read>(reader: R) -> Result<PriceMatrix> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(DataError::Parse(
            "header must contain a date column and at least one ticker".to_string(),
        ));
    }
    let tickers: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    if let Some(empty) = tickers.iter().position(String::is_empty) {
        return Err(DataError::Parse(format!(
            "empty ticker name in header column {}",
            empty + 2
        )));
    }

    let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
    for (line, record) in csv_reader.records().enumerate() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|e| {
            DataError::Parse(format!("row {}: invalid date {raw_date:?}: {e}", line + 2))
        })?;

        let mut cells = Vec::with_capacity(tickers.len());
        for (col, ticker) in tickers.iter().enumerate() {
            let raw = record.get(col + 1).unwrap_or_default();
            cells.push(parse_cell(raw, ticker, date)?);
        }
        rows.push((date, cells));
    }

    if rows.is_empty() {
        return Err(DataError::InsufficientData {
            what: "price rows",
            required: 1,
            actual: 0,
        });
    }

    rows.sort_by_key(|(date, _)| *date);
    if let Some(pair) = rows.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(DataError::DuplicateDate(pair[0].0));
    }

    let dates: Vec<NaiveDate> = rows.iter().map(|(date, _)| *date).collect();
    let mut values = Array2::<f64>::zeros((dates.len(), tickers.len()));
    for (col, ticker) in tickers.iter().enumerate() {
        let mut column: Vec<Option<f64>> = rows.iter().map(|(_, cells)| cells[col]).collect();
        for (row, price) in fill_gaps(ticker, &mut column)?.into_iter().enumerate() {
            values[[row, col]] = price;
        }
    }

    PriceMatrix::new(dates, tickers, values)
}

fn parse_cell(raw: &str, ticker: &str, date: NaiveDate) -> Result<Option<f64>> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    let price: f64 = raw.parse().map_err(|_| {
        DataError::Parse(format!("invalid price {raw:?} for {ticker} on {date}"))
    })?;
    Ok(Some(price))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_basic() {
        let csv = "date,AAA,BBB\n2024-01-02,10,20\n2024-01-03,11,21\n";
        let prices = parse_price_csv(csv.as_bytes()).unwrap();
        assert_eq!(prices.n_periods(), 2);
        assert_eq!(prices.tickers(), &["AAA".to_string(), "BBB".to_string()]);
        assert_relative_eq!(prices.values()[[1, 1]], 21.0);
    }

    #[test]
    fn test_parse_sorts_and_fills() {
        let csv = "date,AAA,BBB\n2024-01-04,12,\n2024-01-02,,20\n2024-01-03,11,21\n";
        let prices = parse_price_csv(csv.as_bytes()).unwrap();

        let first = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(prices.dates()[0], first);

        let aaa = prices.column("AAA").unwrap();
        assert_relative_eq!(aaa[0], 11.0); // back-filled
        let bbb = prices.column("BBB").unwrap();
        assert_relative_eq!(bbb[2], 21.0); // forward-filled
    }

    #[test]
    fn test_parse_rejects_duplicate_dates() {
        let csv = "date,AAA\n2024-01-02,10\n2024-01-02,11\n";
        assert!(matches!(
            parse_price_csv(csv.as_bytes()),
            Err(DataError::DuplicateDate(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_price() {
        let csv = "date,AAA\n2024-01-02,abc\n";
        assert!(matches!(
            parse_price_csv(csv.as_bytes()),
            Err(DataError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_column() {
        let csv = "date,AAA,BBB\n2024-01-02,10,\n2024-01-03,11,\n";
        assert!(matches!(
            parse_price_csv(csv.as_bytes()),
            Err(DataError::MissingData { .. })
        ));
    }
}
