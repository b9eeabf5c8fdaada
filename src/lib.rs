//! Kelly - capital allocation from historical prices
//!
//! This library provides:
//! - Date alignment and CSV loading of daily price histories
//! - Annualized excess-return statistics (mean vector, covariance matrix)
//! - Multi-asset Kelly leverage with Sharpe ratio and growth rate
//! - Yahoo Finance price download (`fetch` feature)
//!
//! # Example
//!
//! ```no_run
//! use kelly::data::load_price_csv;
//! use kelly::{estimate, solve};
//!
//! let prices = load_price_csv("prices.csv")?;
//! let stats = estimate(&prices, 0.05, 2, false)?;
//! let (result, advisories) = solve(&stats, 0.05, false)?;
//!
//! for asset in &result.assets {
//!     println!("{}: {:.2}x", asset.ticker, asset.recommended);
//! }
//! println!("Sharpe: {:.3}", result.sharpe_ratio);
//! # Ok::<(), kelly::KellyError>(())
//! ```

pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod models;

// Network price source (only available with fetch feature)
#[cfg(feature = "fetch")]
pub mod fetch;

// Re-export commonly used types
pub use crate::config::{AnnualizationConfig, RiskFreeConvention, SolverConfig};
pub use crate::core::{estimate, solve, KellySolver, ReturnEstimator};
pub use crate::data::{PriceHistory, PriceSeries};
pub use crate::error::{DataError, KellyError, SingularMatrixError};
pub use crate::models::{Advisory, AssetLeverage, KellyPolicy, LeverageResult, Statistics};

/// Estimate statistics and solve for leverage in one step
///
/// # Arguments
/// * `prices` - Aligned daily prices
/// * `risk_free_rate` - Annual risk-free rate
/// * `lookback` - Minimum number of aligned price points
/// * `diagonal` - Ignore cross-asset correlation
/// * `full_kelly` - Recommend full instead of half Kelly
pub fn run(
    prices: &PriceHistory,
    risk_free_rate: f64,
    lookback: usize,
    diagonal: bool,
    full_kelly: bool,
) -> Result<(LeverageResult, Vec<Advisory>), KellyError> {
    let stats = estimate(prices, risk_free_rate, lookback, diagonal)?;
    Ok(solve(&stats, risk_free_rate, full_kelly)?)
}
