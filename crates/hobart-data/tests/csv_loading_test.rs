//! Integration tests for loading price files from disk.

use chrono::NaiveDate;
use hobart_data::loader::{read_price_csv, read_price_series_csv};
use hobart_data::{DataError, PriceMatrix, PriceSeries};
use rstest::rstest;
use std::io::Write;
use std::path::PathBuf;

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("hobart_data_{}_{}", std::process::id(), name));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn test_read_price_csv_from_disk() {
    let path = write_temp(
        "wide.csv",
        "date,AAPL,MSFT,SPY\n2024-01-02,185.6,370.9,472.7\n2024-01-03,184.3,370.6,468.8\n2024-01-04,181.9,367.9,467.3\n",
    );

    let prices = read_price_csv(&path).unwrap();
    assert_eq!(prices.n_assets(), 3);
    assert_eq!(prices.n_periods(), 3);

    let returns = prices.returns().unwrap();
    assert_eq!(returns.n_periods(), 2);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_read_benchmark_series() {
    let path = write_temp(
        "bench.csv",
        "date,SPY\n2024-01-02,472.7\n2024-01-03,468.8\n",
    );

    let series = read_price_series_csv(&path, None).unwrap();
    assert_eq!(series.ticker(), "SPY");
    assert_eq!(series.len(), 2);

    let named = read_price_series_csv(&path, Some("SPY")).unwrap();
    assert_eq!(named, series);
    assert!(read_price_series_csv(&path, Some("QQQ")).is_err());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_file_is_io_error() {
    let result = read_price_csv("/definitely/not/here.csv");
    assert!(matches!(result, Err(DataError::Io(_))));
}

#[rstest]
#[case(0, true)]
#[case(1, true)]
#[case(2, false)]
fn test_returns_require_two_rows(#[case] rows: usize, #[case] insufficient: bool) {
    let series = PriceSeries::from_pairs(
        "AAA",
        (0..rows).map(|i| {
            (
                NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32).unwrap(),
                100.0 + i as f64,
            )
        }),
    )
    .unwrap();

    if rows == 0 {
        // An empty series cannot even form a matrix column to take returns from.
        assert!(series.is_empty());
        let matrix = series.to_matrix().unwrap();
        assert_eq!(matrix.n_periods(), 0);
    }

    let result = series.returns();
    assert_eq!(result.is_err(), insufficient);
    if let Err(err) = result {
        assert!(err.is_insufficient_data());
    }
}

#[test]
fn test_from_series_union_of_dates() {
    let d = |day| NaiveDate::from_ymd_opt(2024, 2, day).unwrap();
    let a = PriceSeries::from_pairs("AAA", [(d(1), 1.0), (d(3), 3.0)]).unwrap();
    let b = PriceSeries::from_pairs("BBB", [(d(2), 2.0), (d(4), 4.0)]).unwrap();

    let prices = PriceMatrix::from_series(vec![a, b]).unwrap();
    assert_eq!(prices.dates(), &[d(1), d(2), d(3), d(4)]);
    assert_eq!(prices.column("AAA").unwrap().to_vec(), vec![1.0, 1.0, 3.0, 3.0]);
    assert_eq!(prices.column("BBB").unwrap().to_vec(), vec![2.0, 2.0, 2.0, 4.0]);
}
