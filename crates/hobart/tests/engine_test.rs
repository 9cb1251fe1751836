//! End-to-end engine tests over synthetic prices.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use hobart::data::{PriceMatrix, PriceSeries};
use hobart::optim::WeightVector;
use hobart::{AllocationMethod, Engine, EngineConfig, ErrorKind, Outcome};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

const TICKERS: [&str; 4] = ["AAA", "BBB", "CCC", "DDD"];

fn dates(n: usize) -> Vec<NaiveDate> {
    (0..n)
        .map(|i| NaiveDate::from_ymd_opt(2022, 1, 3).unwrap() + chrono::Days::new(i as u64))
        .collect()
}

/// Random-walk prices with distinct drifts and volatilities.
fn synthetic_prices(seed: u64, n_periods: usize) -> PriceMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let drift = [0.0015, 0.0008, 0.0012, 0.0006];
    let vol = [0.02, 0.01, 0.015, 0.005];
    let mut values = Array2::<f64>::zeros((n_periods, TICKERS.len()));
    for j in 0..TICKERS.len() {
        values[[0, j]] = 100.0;
    }
    for t in 1..n_periods {
        let common: f64 = rng.gen_range(-1.0..1.0) * 0.005;
        for j in 0..TICKERS.len() {
            let shock: f64 = rng.gen_range(-1.0..1.0) * vol[j] * 1.7;
            values[[t, j]] = values[[t - 1, j]] * (1.0 + drift[j] + common + shock);
        }
    }
    PriceMatrix::new(
        dates(n_periods),
        TICKERS.iter().map(|t| t.to_string()).collect(),
        values,
    )
    .unwrap()
}

fn benchmark(n_periods: usize) -> PriceSeries {
    let prices = (0..n_periods).map(|i| 100.0 * 1.0003_f64.powi(i as i32)).collect();
    PriceSeries::new("SPY", dates(n_periods), prices).unwrap()
}

#[rstest]
#[case(AllocationMethod::MaxSharpe)]
#[case(AllocationMethod::MinVolatility)]
#[case(AllocationMethod::Hrp)]
fn test_allocations_are_fully_invested(#[case] method: AllocationMethod) {
    let engine = Engine::default();
    let prices = synthetic_prices(7, 300);
    let allocation = engine.try_allocate(method, &prices).unwrap();

    assert_relative_eq!(allocation.weights.sum(), 1.0, epsilon = 1e-6);
    assert!(allocation.weights.values().iter().all(|w| *w >= -1e-9));
    assert_eq!(allocation.weights.tickers(), prices.tickers());
}

#[test]
fn test_success_serialization_is_tagged() {
    let engine = Engine::default();
    let outcome = engine.max_sharpe(&synthetic_prices(11, 300));
    assert!(outcome.is_success());

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["method"], "max_sharpe");
    assert!(json["weights"].is_object());
    let sharpe = json["performance"]["sharpe_ratio"].as_str().unwrap();
    assert_eq!(sharpe.split('.').nth(1).map(str::len), Some(2));
    assert!(
        json["performance"]["annual_volatility"]
            .as_str()
            .unwrap()
            .ends_with('%')
    );
}

#[test]
fn test_hrp_outcome_has_ordering() {
    let engine = Engine::default();
    let json = serde_json::to_value(engine.hrp(&synthetic_prices(3, 200))).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["ordering"].as_array().unwrap().len(), TICKERS.len());
}

#[test]
fn test_error_serialization_is_tagged() {
    let engine = Engine::default();
    let prices = synthetic_prices(5, 2);
    let json = serde_json::to_value(engine.efficient_frontier(&prices)).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["kind"], "insufficient_data");
    assert!(!json["message"].as_str().unwrap().is_empty());
}

#[test]
fn test_no_asset_beats_risk_free_rate() {
    let engine = Engine::new(EngineConfig {
        risk_free_rate: 5.0,
        ..Default::default()
    })
    .unwrap();
    let outcome = engine.max_sharpe(&synthetic_prices(5, 300));
    assert_eq!(outcome.error_kind(), Some(ErrorKind::SolverInfeasible));
    match outcome {
        Outcome::Error { message, .. } => assert!(message.contains("risk-free rate")),
        Outcome::Success(_) => panic!("expected an error"),
    }
}

#[test]
fn test_reported_stats_are_reproducible() {
    let engine = Engine::default();
    let prices = synthetic_prices(21, 400);

    for method in [AllocationMethod::MaxSharpe, AllocationMethod::MinVolatility] {
        let allocation = engine.try_allocate(method, &prices).unwrap();
        let again = engine
            .try_portfolio_performance(&prices, &allocation.weights)
            .unwrap();
        assert_relative_eq!(
            again.expected_annual_return,
            allocation.performance.expected_annual_return,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            again.annual_volatility,
            allocation.performance.annual_volatility,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            again.sharpe_ratio,
            allocation.performance.sharpe_ratio,
            epsilon = 1e-12
        );
    }
}

#[test]
fn test_frontier_through_engine() {
    let engine = Engine::new(EngineConfig {
        frontier_points: 15,
        ..Default::default()
    })
    .unwrap();
    let result = engine
        .try_efficient_frontier(&synthetic_prices(13, 300))
        .unwrap();

    let returns = result.frontier.returns();
    assert!(returns.windows(2).all(|w| w[0] <= w[1]));
    let min_risk = result.min_volatility.performance.annual_volatility;
    assert!(result.frontier.risks().iter().all(|r| *r >= min_risk - 1e-3));
    assert_eq!(result.requested, 15);
}

#[test]
fn test_backtest_with_optimized_weights() {
    let engine = Engine::default();
    let prices = synthetic_prices(17, 120);
    let weights = engine.try_min_volatility(&prices).unwrap().weights;
    let report = engine.try_backtest(&prices, &weights, &benchmark(120)).unwrap();

    assert_eq!(report.records.len(), 119);
    assert_eq!(report.benchmark, "SPY");
    let last = report.records.last().unwrap();
    assert_relative_eq!(
        last.benchmark_cumulative_return,
        1.0003_f64.powi(119) - 1.0,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        report.summary.excess_return,
        report.summary.portfolio_total_return - report.summary.benchmark_total_return,
        epsilon = 1e-12
    );
}

#[test]
fn test_backtest_without_overlap() {
    let engine = Engine::default();
    let prices = synthetic_prices(17, 10);
    let weights = WeightVector::new(
        prices.tickers().to_vec(),
        ndarray::Array1::from(vec![0.25; 4]),
    )
    .unwrap();
    let later: Vec<NaiveDate> = (0..10)
        .map(|i| NaiveDate::from_ymd_opt(2023, 6, 1).unwrap() + chrono::Days::new(i))
        .collect();
    let bench = PriceSeries::new("SPY", later, vec![100.0; 10]).unwrap();

    let outcome = engine.backtest(&prices, &weights, &bench);
    assert_eq!(outcome.error_kind(), Some(ErrorKind::DataAlignment));
}

#[test]
fn test_config_file_drives_engine() {
    let dir = std::env::temp_dir().join(format!("hobart-engine-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, r#"{"upper_bound": 0.3, "cluster_variance": "full"}"#).unwrap();

    let engine = Engine::new(EngineConfig::from_json_file(&path).unwrap()).unwrap();
    let allocation = engine
        .try_min_volatility(&synthetic_prices(9, 300))
        .unwrap();
    assert!(allocation.weights.values().iter().all(|w| *w <= 0.3 + 1e-6));

    std::fs::remove_dir_all(&dir).unwrap();
}
