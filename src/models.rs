use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Annualized excess-return statistics for a set of assets
///
/// Produced by the return estimator and read by the Kelly solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    tickers: Vec<String>,
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
    observations: usize,
    diagonal: bool,
}

impl Statistics {
    /// Build statistics from already annualized moments
    ///
    /// Dimensions are not checked here; the solver rejects inconsistent
    /// statistics.
    pub fn new(
        tickers: Vec<String>,
        mean: DVector<f64>,
        covariance: DMatrix<f64>,
        observations: usize,
    ) -> Self {
        let diagonal = is_diagonal(&covariance);
        Self {
            tickers,
            mean,
            covariance,
            observations,
            diagonal,
        }
    }

    pub(crate) fn with_policy(
        tickers: Vec<String>,
        mean: DVector<f64>,
        covariance: DMatrix<f64>,
        observations: usize,
        diagonal: bool,
    ) -> Self {
        Self {
            tickers,
            mean,
            covariance,
            observations,
            diagonal,
        }
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Annualized mean excess return per asset (M)
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Annualized covariance of excess returns (C)
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Number of return periods the moments were estimated from
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Whether cross-asset covariances were zeroed
    pub fn is_diagonal(&self) -> bool {
        self.diagonal
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

fn is_diagonal(m: &DMatrix<f64>) -> bool {
    m.row_iter().enumerate().all(|(i, row)| {
        row.iter()
            .enumerate()
            .all(|(j, &v)| i == j || v == 0.0)
    })
}

/// Which leverage is recommended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KellyPolicy {
    Full,
    #[default]
    Half,
}

impl KellyPolicy {
    pub fn from_full_kelly(full_kelly: bool) -> Self {
        if full_kelly {
            KellyPolicy::Full
        } else {
            KellyPolicy::Half
        }
    }

    /// Multiplier applied to the full-Kelly vector
    pub fn scale(&self) -> f64 {
        match self {
            KellyPolicy::Full => 1.0,
            KellyPolicy::Half => 0.5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            KellyPolicy::Full => "Full",
            KellyPolicy::Half => "Half",
        }
    }
}

/// Leverage recommendation for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetLeverage {
    pub ticker: String,
    pub full_kelly: f64,
    pub half_kelly: f64,
    pub recommended: f64,
    pub annualized_excess_return: f64,
}

/// Output of a single Kelly solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageResult {
    pub assets: Vec<AssetLeverage>,
    pub policy: KellyPolicy,
    /// Sharpe ratio of the recommended leverage
    pub sharpe_ratio: f64,
    /// Sharpe ratio of the unscaled full-Kelly leverage
    pub full_kelly_sharpe_ratio: f64,
    /// Expected compounded growth rate of the recommended leverage
    pub growth_rate: f64,
    pub risk_free_rate: f64,
    pub observations: usize,
}

impl LeverageResult {
    pub fn full_kelly(&self) -> Vec<f64> {
        self.assets.iter().map(|a| a.full_kelly).collect()
    }
}

/// Non-fatal notice returned alongside a successful solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    HighLeverage {
        ticker: String,
        leverage: f64,
        threshold: f64,
    },
    SmallSample {
        observations: usize,
        minimum: usize,
    },
    GaussianAssumption,
    ContinuousRebalancing,
    RegimeShift,
}

impl Advisory {
    /// Standing disclaimers are attached to every result
    pub fn disclaimers() -> [Advisory; 3] {
        [
            Advisory::GaussianAssumption,
            Advisory::ContinuousRebalancing,
            Advisory::RegimeShift,
        ]
    }

    pub fn is_disclaimer(&self) -> bool {
        matches!(
            self,
            Advisory::GaussianAssumption | Advisory::ContinuousRebalancing | Advisory::RegimeShift
        )
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::HighLeverage {
                ticker, leverage, ..
            } => write!(
                f,
                "{}: leverage is {:.2}x (implies {} position)",
                ticker,
                leverage,
                if *leverage > 0.0 { "leveraged long" } else { "short" }
            ),
            Advisory::SmallSample { observations, .. } => write!(
                f,
                "Small sample size ({} observations). Estimates may be unreliable.",
                observations
            ),
            Advisory::GaussianAssumption => write!(
                f,
                "Kelly criterion assumes returns are Gaussian and i.i.d. \
                 Real markets deviate significantly from these assumptions."
            ),
            Advisory::ContinuousRebalancing => write!(
                f,
                "Results require continuous rebalancing to the target allocation."
            ),
            Advisory::RegimeShift => write!(
                f,
                "Past return distributions may not persist (regime shifts)."
            ),
        }
    }
}
