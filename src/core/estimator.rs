//! Return Estimation
//!
//! Turns aligned daily prices into annualized excess-return statistics.
//!
//! ```text
//! r[t]   = (p[t] - p[t-1]) / p[t-1]
//! x[t]   = r[t] - rf_daily
//! M      = mean(x) * 252
//! C      = cov(x) * 252        (sample covariance, n - 1)
//! ```
//!
//! The daily risk-free rate comes from [`AnnualizationConfig`]; by default
//! `rf_daily = rf_annual / 252`.

use nalgebra::{DMatrix, DVector};

use crate::config::AnnualizationConfig;
use crate::data::PriceHistory;
use crate::error::{validate_price, validate_risk_free_rate, DataError};
use crate::models::Statistics;

/// Fewest aligned prices that give a defined sample covariance
/// (two returns, one degree of freedom)
pub const MIN_PRICE_POINTS: usize = 3;

/// Per-period returns, one row per period and one column per asset
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    tickers: Vec<String>,
    values: DMatrix<f64>,
}

impl ReturnMatrix {
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Periods x assets
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Number of return periods
    pub fn periods(&self) -> usize {
        self.values.nrows()
    }

    pub fn num_assets(&self) -> usize {
        self.values.ncols()
    }

    /// Returns of one asset across all periods
    pub fn asset(&self, index: usize) -> Vec<f64> {
        self.values.column(index).iter().copied().collect()
    }

    /// New matrix with a constant per-period rate subtracted
    pub fn excess_over(&self, periodic_rate: f64) -> ReturnMatrix {
        ReturnMatrix {
            tickers: self.tickers.clone(),
            values: self.values.map(|r| r - periodic_rate),
        }
    }

    /// Sample mean of each column
    pub fn mean(&self) -> DVector<f64> {
        let n = self.periods() as f64;
        DVector::from_iterator(
            self.num_assets(),
            self.values.column_iter().map(|col| col.sum() / n),
        )
    }

    /// Sample covariance of the columns (denominator n - 1)
    pub fn covariance(&self) -> DMatrix<f64> {
        let n = self.periods();
        let k = self.num_assets();
        let mean = self.mean();

        let mut centered = self.values.clone();
        for (j, mut col) in centered.column_iter_mut().enumerate() {
            col.add_scalar_mut(-mean[j]);
        }

        let mut cov = centered.transpose() * &centered / (n as f64 - 1.0);

        // Exact symmetry for the eigen and Cholesky paths
        for i in 0..k {
            for j in (i + 1)..k {
                let v = 0.5 * (cov[(i, j)] + cov[(j, i)]);
                cov[(i, j)] = v;
                cov[(j, i)] = v;
            }
        }

        cov
    }
}

/// Simple arithmetic returns `(p[t] - p[t-1]) / p[t-1]`
///
/// Every price must be finite and strictly positive.
pub fn compute_returns(prices: &PriceHistory) -> Result<ReturnMatrix, DataError> {
    if prices.num_assets() == 0 {
        return Err(DataError::NoAssets);
    }
    if prices.len() < 2 {
        return Err(DataError::InsufficientData {
            got: prices.len(),
            need: 2,
        });
    }

    for (ticker, column) in prices.tickers().iter().zip(prices.columns()) {
        for (date, &price) in prices.dates().iter().zip(column) {
            validate_price(ticker, *date, price)?;
        }
    }

    let periods = prices.len() - 1;
    let values = DMatrix::from_fn(periods, prices.num_assets(), |t, i| {
        let column = prices.column(i);
        (column[t + 1] - column[t]) / column[t]
    });

    Ok(ReturnMatrix {
        tickers: prices.tickers().to_vec(),
        values,
    })
}

/// Zero every off-diagonal entry, keeping variances
pub fn diagonal_only(covariance: &DMatrix<f64>) -> DMatrix<f64> {
    DMatrix::from_diagonal(&covariance.diagonal())
}

/// Estimator with a fixed annualization convention
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnEstimator {
    config: AnnualizationConfig,
}

impl ReturnEstimator {
    pub fn new(config: AnnualizationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnnualizationConfig {
        &self.config
    }

    /// Daily excess returns over the risk-free rate
    pub fn excess_returns(
        &self,
        prices: &PriceHistory,
        risk_free_rate: f64,
    ) -> Result<ReturnMatrix, DataError> {
        validate_risk_free_rate(risk_free_rate)?;
        let returns = compute_returns(prices)?;
        Ok(returns.excess_over(self.config.daily_risk_free(risk_free_rate)))
    }

    /// Annualized mean and covariance of daily excess returns
    ///
    /// # Arguments
    /// * `prices` - Aligned daily prices
    /// * `risk_free_rate` - Annual risk-free rate (0.05 = 5%)
    /// * `lookback` - Minimum number of aligned price points required
    /// * `diagonal` - Drop cross-asset covariances
    pub fn estimate(
        &self,
        prices: &PriceHistory,
        risk_free_rate: f64,
        lookback: usize,
        diagonal: bool,
    ) -> Result<Statistics, DataError> {
        let need = lookback.max(MIN_PRICE_POINTS);
        if prices.len() < need {
            return Err(DataError::InsufficientData {
                got: prices.len(),
                need,
            });
        }

        let excess = self.excess_returns(prices, risk_free_rate)?;

        let mean = excess.mean().map(|m| self.config.annualize(m));
        let mut covariance = excess.covariance().map(|c| self.config.annualize(c));
        if diagonal {
            covariance = diagonal_only(&covariance);
        }

        tracing::debug!(
            "Estimated {} assets over {} periods: M = {:?}",
            excess.num_assets(),
            excess.periods(),
            mean.as_slice()
        );

        Ok(Statistics::with_policy(
            excess.tickers().to_vec(),
            mean,
            covariance,
            excess.periods(),
            diagonal,
        ))
    }
}

/// Estimate with the default annualization (252 days, simple risk-free rate)
pub fn estimate(
    prices: &PriceHistory,
    risk_free_rate: f64,
    lookback: usize,
    diagonal: bool,
) -> Result<Statistics, DataError> {
    ReturnEstimator::default().estimate(prices, risk_free_rate, lookback, diagonal)
}
