//! Kelly CLI - optimal capital allocation from historical prices

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use kelly::data::load_price_series;
use kelly::{
    Advisory, AnnualizationConfig, DataError, KellyError, KellySolver, LeverageResult,
    PriceHistory, PriceSeries, ReturnEstimator, RiskFreeConvention, SingularMatrixError,
    SolverConfig,
};

/// Exit code for data and computation failures
const EXIT_DATA_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "kelly")]
#[command(author, version, about = "Calculate optimal capital allocation using the Kelly criterion.", long_about = None)]
struct Cli {
    /// Ticker symbols (e.g. AAPL MSFT GOOG)
    #[arg(required = true)]
    tickers: Vec<String>,

    /// CSV file with a date column and one price column per ticker
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Lookback period in calendar days (~6 months)
    #[arg(long, default_value = "126", value_parser = clap::value_parser!(u32).range(1..))]
    lookback: u32,

    /// Minimum number of aligned price points required
    #[arg(long, default_value = "2")]
    min_periods: usize,

    /// Annual risk-free rate
    #[arg(long, default_value = "0.05", allow_negative_numbers = true)]
    risk_free_rate: f64,

    /// Convert the risk-free rate to a daily rate by compounding instead of dividing
    #[arg(long)]
    compounded_rf: bool,

    /// Use only diagonal covariance (ignore correlations)
    #[arg(long)]
    diagonal: bool,

    /// Recommend full Kelly instead of half Kelly
    #[arg(long)]
    full_kelly: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    result: &'a LeverageResult,
    advisories: &'a [Advisory],
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set subscriber: {}", e);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Data and solve failures exit with 2, everything else with 1
fn exit_code(err: &anyhow::Error) -> u8 {
    let typed = err.chain().any(|cause| {
        cause.is::<DataError>() || cause.is::<SingularMatrixError>() || cause.is::<KellyError>()
    });

    #[cfg(feature = "fetch")]
    let typed = typed || err.chain().any(|cause| cause.is::<kelly::fetch::FetchError>());

    if typed {
        EXIT_DATA_ERROR
    } else {
        1
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut tickers: Vec<String> = Vec::with_capacity(cli.tickers.len());
    for ticker in cli.tickers.iter().map(|t| t.to_uppercase()) {
        if !tickers.contains(&ticker) {
            tickers.push(ticker);
        }
    }

    let series = match &cli.prices {
        Some(path) => load_from_csv(path, &tickers)?,
        None => fetch_prices(&tickers, cli.lookback)?,
    };

    let prices = PriceHistory::align(series)?.trailing_days(cli.lookback);
    info!(
        "Using {} aligned rows for {}",
        prices.len(),
        prices.tickers().join(", ")
    );

    let convention = if cli.compounded_rf {
        RiskFreeConvention::Compounded
    } else {
        RiskFreeConvention::Simple
    };
    let estimator = ReturnEstimator::new(AnnualizationConfig {
        risk_free: convention,
        ..AnnualizationConfig::default()
    });
    let solver = KellySolver::new(SolverConfig::default());

    let stats = estimator.estimate(&prices, cli.risk_free_rate, cli.min_periods, cli.diagonal)?;
    let (result, advisories) = solver.solve(&stats, cli.risk_free_rate, cli.full_kelly)?;

    if cli.json {
        let report = JsonReport {
            result: &result,
            advisories: &advisories,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_results(&result);
        print_advisories(&advisories);
    }

    Ok(())
}

/// Read the requested tickers from a price file
fn load_from_csv(path: &Path, tickers: &[String]) -> Result<Vec<PriceSeries>> {
    let mut available = load_price_series(path)
        .with_context(|| format!("Failed to load prices from {:?}", path))?;

    let mut selected = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let idx = available
            .iter()
            .position(|s| &s.ticker == ticker)
            .ok_or_else(|| DataError::EmptySeries(ticker.clone()))?;
        selected.push(available.swap_remove(idx));
    }

    Ok(selected)
}

#[cfg(feature = "fetch")]
fn fetch_prices(tickers: &[String], lookback_days: u32) -> Result<Vec<PriceSeries>> {
    use kelly::fetch::{FetchConfig, YahooClient};

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let client = YahooClient::new(FetchConfig::default())?;
    let series = runtime.block_on(client.fetch_history(tickers, lookback_days))?;
    Ok(series)
}

#[cfg(not(feature = "fetch"))]
fn fetch_prices(_tickers: &[String], _lookback_days: u32) -> Result<Vec<PriceSeries>> {
    anyhow::bail!("No price file given. Pass --prices <CSV> or build with the `fetch` feature to download prices.")
}

/// Print the allocation table
fn print_results(result: &LeverageResult) {
    println!();
    println!("{}", "=".repeat(60));
    println!("{}", "Kelly Criterion Capital Allocation".cyan().bold());
    println!("{}", "=".repeat(60));

    println!(
        "{:<10} {:>12} {:>12} {:>12}",
        "Ticker", "Full Kelly", "Half Kelly", "Ann. Excess"
    );
    println!("{}", "-".repeat(60));

    for asset in &result.assets {
        println!(
            "{:<10} {:>12.4} {:>12.4} {:>12.4}",
            asset.ticker, asset.full_kelly, asset.half_kelly, asset.annualized_excess_return
        );
    }

    println!("{}", "-".repeat(60));
    println!(
        "Recommended allocation: {}",
        format!("{} Kelly", result.policy.label()).green().bold()
    );
    println!("Portfolio Sharpe Ratio: {:.4}", result.sharpe_ratio);
    println!(
        "Max Growth Rate (CAGR): {:.4} ({:.2}%)",
        result.growth_rate,
        result.growth_rate * 100.0
    );
    println!("Observations:           {}", result.observations);
    println!("{}", "=".repeat(60));
    println!();
}

/// Print warnings and disclaimers to stderr
fn print_advisories(advisories: &[Advisory]) {
    let high: Vec<&Advisory> = advisories
        .iter()
        .filter(|a| matches!(a, Advisory::HighLeverage { .. }))
        .collect();

    if !high.is_empty() {
        eprintln!();
        eprintln!("{}", "WARNING: High leverage detected:".yellow().bold());
        for advisory in high {
            eprintln!("  - {}", advisory);
        }
    }

    for advisory in advisories
        .iter()
        .filter(|a| matches!(a, Advisory::SmallSample { .. }))
    {
        eprintln!();
        eprintln!("{} {}", "WARNING:".yellow().bold(), advisory);
    }

    eprintln!();
    eprintln!("{}", "DISCLAIMERS:".dimmed());
    for advisory in advisories.iter().filter(|a| a.is_disclaimer()) {
        eprintln!("  - {}", advisory.to_string().dimmed());
    }
}
