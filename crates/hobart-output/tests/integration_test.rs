//! Backtest and export workflow tests.

use approx::assert_relative_eq;
use chrono::{Days, NaiveDate};
use hobart_data::{PriceMatrix, PriceSeries};
use hobart_optim::WeightVector;
use hobart_output::{ExportFormat, Exporter, PerformanceEvaluator};
use ndarray::{Array1, Array2};

fn dates(first: NaiveDate, n: u64) -> Vec<NaiveDate> {
    (0..n).map(|i| first + Days::new(i)).collect()
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_records_cover_only_shared_dates() {
    // Prices start one day before the first return date of each series
    let portfolio_dates = dates(ymd(2019, 12, 31), 6); // returns 2020-01-01..05
    let benchmark_dates = dates(ymd(2020, 1, 2), 6); // returns 2020-01-03..07

    let prices = PriceMatrix::new(
        portfolio_dates,
        vec!["AAA".to_string(), "BBB".to_string()],
        Array2::from_shape_fn((6, 2), |(t, j)| 100.0 + (t * (j + 1)) as f64),
    )
    .unwrap();
    let benchmark = PriceSeries::new(
        "SPY",
        benchmark_dates,
        vec![50.0, 50.5, 51.0, 50.0, 50.2, 51.3],
    )
    .unwrap();
    let weights = WeightVector::new(
        vec!["AAA".to_string(), "BBB".to_string()],
        Array1::from(vec![0.5, 0.5]),
    )
    .unwrap();

    let report = PerformanceEvaluator::default()
        .evaluate(&prices, &weights, &benchmark)
        .unwrap();

    let got: Vec<NaiveDate> = report.records.iter().map(|r| r.date).collect();
    assert_eq!(got, vec![ymd(2020, 1, 3), ymd(2020, 1, 4), ymd(2020, 1, 5)]);

    // Benchmark cumulates from its own first return
    assert_relative_eq!(
        report.records[0].benchmark_cumulative_return,
        50.5 / 50.0 - 1.0,
        epsilon = 1e-12
    );
    // Portfolio has already compounded two periods by 2020-01-03
    let r1 = 0.5 * (101.0 / 100.0 - 1.0) + 0.5 * (102.0 / 100.0 - 1.0);
    let r2 = 0.5 * (102.0 / 101.0 - 1.0) + 0.5 * (104.0 / 102.0 - 1.0);
    let r3 = 0.5 * (103.0 / 102.0 - 1.0) + 0.5 * (106.0 / 104.0 - 1.0);
    assert_relative_eq!(
        report.records[0].portfolio_cumulative_return,
        (1.0 + r1) * (1.0 + r2) * (1.0 + r3) - 1.0,
        epsilon = 1e-12
    );
    assert_eq!(report.summary.periods, 3);
}

#[test]
fn test_weights_for_unknown_tickers_are_ignored() {
    let prices = PriceMatrix::new(
        dates(ymd(2021, 6, 1), 3),
        vec!["AAA".to_string()],
        Array2::from_shape_vec((3, 1), vec![10.0, 11.0, 12.1]).unwrap(),
    )
    .unwrap();
    let benchmark = PriceSeries::new("SPY", dates(ymd(2021, 6, 1), 3), vec![1.0, 1.0, 1.0])
        .unwrap();
    let weights = WeightVector::new(
        vec!["AAA".to_string(), "ZZZ".to_string()],
        Array1::from(vec![1.0, 0.0]),
    )
    .unwrap();

    let report = PerformanceEvaluator::default()
        .evaluate(&prices, &weights, &benchmark)
        .unwrap();
    assert_relative_eq!(report.summary.portfolio_total_return, 0.21, epsilon = 1e-12);
    assert_relative_eq!(report.summary.excess_return, 0.21, epsilon = 1e-12);
}

#[test]
fn test_export_backtest_to_file() {
    let prices = PriceMatrix::new(
        dates(ymd(2022, 3, 1), 4),
        vec!["AAA".to_string()],
        Array2::from_shape_vec((4, 1), vec![10.0, 10.5, 10.2, 10.8]).unwrap(),
    )
    .unwrap();
    let benchmark =
        PriceSeries::new("SPY", dates(ymd(2022, 3, 1), 4), vec![5.0, 5.1, 5.2, 5.0]).unwrap();
    let weights = WeightVector::new(vec!["AAA".to_string()], Array1::from(vec![1.0])).unwrap();
    let report = PerformanceEvaluator::default()
        .evaluate(&prices, &weights, &benchmark)
        .unwrap();

    let path = std::env::temp_dir().join(format!("hobart_backtest_{}.csv", std::process::id()));
    report.export_to_file(&path, ExportFormat::Csv).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 4); // header + 3 records
    assert!(contents.contains("2022-03-04"));
    std::fs::remove_file(path).ok();

    let json = report.export_to_string(ExportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["benchmark"], "SPY");
    assert_eq!(value["records"].as_array().unwrap().len(), 3);
}
