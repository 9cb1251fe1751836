use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use chrono::{Days, NaiveDate};
use hobart_data::ReturnSeries;
use hobart_optim::{EfficientFrontier, HierarchicalRiskParity, MeanVarianceOptimizer};
use hobart_risk::{CovarianceEstimator, ReturnsEstimator, SampleCovarianceEstimator};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn synthetic_returns(n_assets: usize, n_periods: usize) -> ReturnSeries {
    let mut rng = StdRng::seed_from_u64(7);
    let drift: Vec<f64> = (0..n_assets).map(|_| rng.gen_range(0.0006..0.0015)).collect();
    let values = Array2::from_shape_fn((n_periods, n_assets), |(_, j)| {
        drift[j] + rng.gen_range(-0.02..0.02)
    });
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let dates = (0..n_periods).map(|i| start + Days::new(i as u64)).collect();
    let tickers = (0..n_assets).map(|i| format!("A{i}")).collect();
    ReturnSeries::new(dates, tickers, values).unwrap()
}

fn bench_mean_variance(c: &mut Criterion) {
    let mut group = c.benchmark_group("mean_variance");
    for n_assets in [10, 30, 60] {
        let returns = synthetic_returns(n_assets, 500);
        let mu = ReturnsEstimator::default()
            .estimate_from_returns(&returns)
            .unwrap();
        let cov = SampleCovarianceEstimator::default()
            .estimate_series(&returns)
            .unwrap();
        let optimizer = MeanVarianceOptimizer::default();

        group.bench_with_input(BenchmarkId::new("max_sharpe", n_assets), &n_assets, |b, _| {
            b.iter(|| optimizer.max_sharpe(black_box(&mu), black_box(&cov)))
        });
        group.bench_with_input(
            BenchmarkId::new("min_volatility", n_assets),
            &n_assets,
            |b, _| b.iter(|| optimizer.min_volatility(black_box(&mu), black_box(&cov))),
        );
    }
    group.finish();
}

fn bench_frontier(c: &mut Criterion) {
    let returns = synthetic_returns(20, 500);
    let mu = ReturnsEstimator::default()
        .estimate_from_returns(&returns)
        .unwrap();
    let cov = SampleCovarianceEstimator::default()
        .estimate_series(&returns)
        .unwrap();
    let sampler = EfficientFrontier::new(MeanVarianceOptimizer::default(), 100).unwrap();

    c.bench_function("frontier_100_points_20_assets", |b| {
        b.iter(|| sampler.sample(black_box(&mu), black_box(&cov)))
    });
}

fn bench_hrp(c: &mut Criterion) {
    let mut group = c.benchmark_group("hrp");
    for n_assets in [10, 50, 100] {
        let returns = synthetic_returns(n_assets, 500);
        let hrp = HierarchicalRiskParity::default();
        group.bench_with_input(BenchmarkId::from_parameter(n_assets), &returns, |b, r| {
            b.iter(|| hrp.allocate(black_box(r)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_mean_variance, bench_frontier, bench_hrp);
criterion_main!(benches);
