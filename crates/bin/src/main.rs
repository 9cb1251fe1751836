//! Hobart CLI binary.
//!
//! Runs the allocation engine over CSV price files.

use clap::{Args, Parser, Subcommand, ValueEnum};
use hobart::data::{PriceMatrix, read_price_csv, read_price_series_csv};
use hobart::optim::WeightVector;
use hobart::output::{ExportFormat, Exporter};
use hobart::{AllocationMethod, Engine, EngineConfig, Outcome};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: portfolio allocation and backtesting", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    options: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalOptions {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Annual risk-free rate, overriding the configuration
    #[arg(long, global = true)]
    risk_free_rate: Option<f64>,

    /// Lower weight bound per asset, overriding the configuration
    #[arg(long, global = true, allow_hyphen_values = true)]
    lower_bound: Option<f64>,

    /// Upper weight bound per asset, overriding the configuration
    #[arg(long, global = true)]
    upper_bound: Option<f64>,

    /// Also write the result to this file (CSV or JSON by extension)
    #[arg(long, global = true)]
    export: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a single allocation
    Optimize {
        /// Price CSV: a date column followed by one column per ticker
        #[arg(long)]
        prices: PathBuf,

        /// Allocation method
        #[arg(long, value_enum, default_value_t = Method::MaxSharpe)]
        method: Method,
    },

    /// Sample the efficient frontier
    Frontier {
        /// Price CSV: a date column followed by one column per ticker
        #[arg(long)]
        prices: PathBuf,

        /// Number of frontier points, overriding the configuration
        #[arg(long)]
        points: Option<usize>,
    },

    /// Backtest fixed weights against a benchmark
    Backtest {
        /// Price CSV: a date column followed by one column per ticker
        #[arg(long)]
        prices: PathBuf,

        /// Benchmark price CSV
        #[arg(long)]
        benchmark: PathBuf,

        /// Benchmark column, when the benchmark file has several
        #[arg(long)]
        benchmark_ticker: Option<String>,

        /// JSON weights: a ticker to weight map, or the output of `optimize --format json`
        #[arg(long, conflicts_with = "method")]
        weights: Option<PathBuf>,

        /// Compute the weights from the prices instead
        #[arg(long, value_enum)]
        method: Option<Method>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Method {
    MaxSharpe,
    MinVolatility,
    Hrp,
}

impl From<Method> for AllocationMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::MaxSharpe => Self::MaxSharpe,
            Method::MinVolatility => Self::MinVolatility,
            Method::Hrp => Self::Hrp,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = match &cli.options.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    apply_overrides(&mut config, &cli.options);

    match cli.command {
        Commands::Optimize { prices, method } => {
            let engine = Engine::new(config)?;
            let prices = load_prices(&prices)?;
            let spinner = spinner(format!("Optimizing {} assets", prices.n_assets()));
            let outcome = engine.allocate(method.into(), &prices);
            spinner.finish_and_clear();
            emit(outcome, &cli.options)
        }
        Commands::Frontier { prices, points } => {
            if let Some(points) = points {
                config.frontier_points = points;
            }
            let engine = Engine::new(config)?;
            let prices = load_prices(&prices)?;
            let spinner = spinner(format!(
                "Sampling {} frontier points",
                engine.config().frontier_points
            ));
            let outcome = engine.efficient_frontier(&prices);
            spinner.finish_and_clear();
            emit(outcome, &cli.options)
        }
        Commands::Backtest {
            prices,
            benchmark,
            benchmark_ticker,
            weights,
            method,
        } => {
            let engine = Engine::new(config)?;
            let prices = load_prices(&prices)?;
            let benchmark = read_price_series_csv(&benchmark, benchmark_ticker.as_deref())?;

            let weights = match (weights, method) {
                (Some(path), _) => load_weights(&path)?,
                (None, Some(method)) => {
                    let allocation = engine.try_allocate(method.into(), &prices)?;
                    info!(method = %AllocationMethod::from(method), "computed weights");
                    allocation.weights
                }
                (None, None) => return Err("backtest needs --weights or --method".into()),
            };

            let spinner = spinner(format!("Backtesting against {}", benchmark.ticker()));
            let outcome = engine.backtest(&prices, &weights, &benchmark);
            spinner.finish_and_clear();
            emit(outcome, &cli.options)
        }
    }
}

fn apply_overrides(config: &mut EngineConfig, options: &GlobalOptions) {
    if let Some(rate) = options.risk_free_rate {
        config.risk_free_rate = rate;
    }
    if let Some(lower) = options.lower_bound {
        config.lower_bound = lower;
    }
    if let Some(upper) = options.upper_bound {
        config.upper_bound = upper;
    }
}

fn load_prices(path: &Path) -> Result<PriceMatrix, Box<dyn std::error::Error>> {
    let prices = read_price_csv(path)?;
    info!(
        path = %path.display(),
        assets = prices.n_assets(),
        rows = prices.n_periods(),
        "loaded prices"
    );
    Ok(prices)
}

/// Weights from a bare ticker map or from a tagged `optimize` result.
fn load_weights(path: &Path) -> Result<WeightVector, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let mut value: serde_json::Value = serde_json::from_str(&text)?;
    if let Some(inner) = value.get_mut("weights") {
        value = inner.take();
    }
    let weights: WeightVector = serde_json::from_value(value)?;
    debug!(path = %path.display(), assets = weights.len(), "loaded weights");
    Ok(weights)
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print the outcome, export it on success, and fail on error.
fn emit<T>(outcome: Outcome<T>, options: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>>
where
    T: Serialize + Display + Exporter,
{
    match options.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => {
            if let Outcome::Success(payload) = &outcome {
                println!("{payload}");
            }
        }
    }

    match outcome {
        Outcome::Success(payload) => {
            if let Some(path) = &options.export {
                let format = ExportFormat::from_path(path);
                payload.export_to_file(path, format)?;
                info!(path = %path.display(), format = format.extension(), "exported");
            }
            Ok(())
        }
        Outcome::Error { kind, message } => Err(format!("{kind}: {message}").into()),
    }
}
