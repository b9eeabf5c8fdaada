//! Kelly Criterion Capital Allocation
//!
//! Optimal leverage across several assets from their excess-return statistics.
//!
//! The multi-asset Kelly criterion:
//!     F* = C⁻¹ M
//!     S  = sqrt(Fᵗ C F)
//!     g  = r + S² / 2
//!
//! Where:
//!     F* = full-Kelly leverage per asset
//!     M  = annualized mean excess return per asset
//!     C  = annualized covariance of excess returns
//!     S  = Sharpe ratio of the leveraged portfolio
//!     r  = annual risk-free rate
//!     g  = maximum compounded growth rate
//!
//! Half Kelly (`F*/2`) is recommended unless full Kelly is requested.
//! S and g are reported for the recommended leverage.

use nalgebra::{DMatrix, DVector};

use super::linalg::solve_symmetric;
use crate::config::SolverConfig;
use crate::error::SingularMatrixError;
use crate::models::{Advisory, AssetLeverage, KellyPolicy, LeverageResult, Statistics};

/// Solve `C·F = M` for the full-Kelly leverage vector
///
/// # Examples
/// ```
/// use kelly::core::kelly::compute_kelly_vector;
/// use nalgebra::{DMatrix, DVector};
///
/// let m = DVector::from_vec(vec![0.1008]);
/// let c = DMatrix::from_row_slice(1, 1, &[0.0252]);
/// let f = compute_kelly_vector(&m, &c, 1e12).unwrap();
/// assert!((f[0] - 4.0).abs() < 1e-9);
/// ```
pub fn compute_kelly_vector(
    mean: &DVector<f64>,
    covariance: &DMatrix<f64>,
    max_condition: f64,
) -> Result<DVector<f64>, SingularMatrixError> {
    solve_symmetric(covariance, mean, max_condition)
}

/// Half-Kelly leverage: F / 2
pub fn compute_half_kelly(full: &DVector<f64>) -> DVector<f64> {
    full * 0.5
}

/// Portfolio Sharpe ratio: S = sqrt(Fᵗ C F)
///
/// Round-off that pushes the quadratic form below zero is clamped, so the
/// result is never negative.
pub fn compute_sharpe(covariance: &DMatrix<f64>, leverage: &DVector<f64>) -> f64 {
    let quadratic = leverage.dot(&(covariance * leverage));
    quadratic.max(0.0).sqrt()
}

/// Maximum growth rate: g = r + S² / 2
pub fn compute_max_growth_rate(risk_free_rate: f64, sharpe: f64) -> f64 {
    risk_free_rate + sharpe * sharpe / 2.0
}

/// Kelly solver with configurable thresholds
#[derive(Debug, Clone, Copy, Default)]
pub struct KellySolver {
    config: SolverConfig,
}

impl KellySolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Compute leverage recommendations from excess-return statistics
    ///
    /// # Arguments
    /// * `stats` - Annualized mean and covariance of excess returns
    /// * `risk_free_rate` - Annual risk-free rate, used for the growth rate
    /// * `full_kelly` - Recommend full Kelly instead of half Kelly
    ///
    /// # Returns
    /// The leverage result and the advisories that apply to it
    pub fn solve(
        &self,
        stats: &Statistics,
        risk_free_rate: f64,
        full_kelly: bool,
    ) -> Result<(LeverageResult, Vec<Advisory>), SingularMatrixError> {
        let mean = stats.mean();
        let covariance = stats.covariance();

        if stats.is_empty() {
            return Err(SingularMatrixError::Empty);
        }
        if stats.tickers().len() != mean.len() {
            return Err(SingularMatrixError::DimensionMismatch {
                means: stats.tickers().len(),
                rows: covariance.nrows(),
                cols: covariance.ncols(),
            });
        }

        let full = compute_kelly_vector(mean, covariance, self.config.max_condition_number)?;
        let half = compute_half_kelly(&full);

        let policy = KellyPolicy::from_full_kelly(full_kelly);
        let recommended = &full * policy.scale();

        let sharpe = compute_sharpe(covariance, &recommended);
        let full_sharpe = compute_sharpe(covariance, &full);
        let growth_rate = compute_max_growth_rate(risk_free_rate, sharpe);

        tracing::debug!(
            "Solved {} assets: F = {:?}, S = {:.4}, g = {:.4}",
            stats.len(),
            full.as_slice(),
            sharpe,
            growth_rate
        );

        let assets: Vec<AssetLeverage> = stats
            .tickers()
            .iter()
            .enumerate()
            .map(|(i, ticker)| AssetLeverage {
                ticker: ticker.clone(),
                full_kelly: full[i],
                half_kelly: half[i],
                recommended: recommended[i],
                annualized_excess_return: mean[i],
            })
            .collect();

        let result = LeverageResult {
            assets,
            policy,
            sharpe_ratio: sharpe,
            full_kelly_sharpe_ratio: full_sharpe,
            growth_rate,
            risk_free_rate,
            observations: stats.observations(),
        };

        let advisories = self.advisories(&result);
        Ok((result, advisories))
    }

    /// Warnings that accompany a result
    pub fn advisories(&self, result: &LeverageResult) -> Vec<Advisory> {
        let threshold = self.config.high_leverage_threshold;

        let mut advisories: Vec<Advisory> = result
            .assets
            .iter()
            .filter(|a| a.recommended.abs() > threshold)
            .map(|a| Advisory::HighLeverage {
                ticker: a.ticker.clone(),
                leverage: a.recommended,
                threshold,
            })
            .collect();

        if result.observations < self.config.min_observations {
            advisories.push(Advisory::SmallSample {
                observations: result.observations,
                minimum: self.config.min_observations,
            });
        }

        for advisory in &advisories {
            tracing::warn!("{}", advisory);
        }

        advisories.extend(Advisory::disclaimers());
        advisories
    }
}

/// Solve with the default thresholds
pub fn solve(
    stats: &Statistics,
    risk_free_rate: f64,
    full_kelly: bool,
) -> Result<(LeverageResult, Vec<Advisory>), SingularMatrixError> {
    KellySolver::default().solve(stats, risk_free_rate, full_kelly)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_asset(mean: f64, variance: f64, observations: usize) -> Statistics {
        Statistics::new(
            vec!["A".to_string()],
            DVector::from_vec(vec![mean]),
            DMatrix::from_row_slice(1, 1, &[variance]),
            observations,
        )
    }

    #[test]
    fn test_single_asset_reduces_to_m_over_variance() {
        // Daily mean 0.0004 and variance 0.0001, annualized by 252
        let stats = single_asset(0.1008, 0.0252, 125);

        let (full, _) = solve(&stats, 0.05, true).unwrap();
        let (half, _) = solve(&stats, 0.05, false).unwrap();

        assert!((full.assets[0].full_kelly - 4.0).abs() < 1e-9);
        assert!((full.assets[0].recommended - 4.0).abs() < 1e-9);
        assert!((half.assets[0].recommended - 2.0).abs() < 1e-9);
        assert!((half.assets[0].half_kelly - 2.0).abs() < 1e-9);
        assert_eq!(half.policy, KellyPolicy::Half);
    }

    #[test]
    fn test_sharpe_single_asset() {
        // S = |m| / s = 0.10 / 0.20
        let stats = single_asset(0.10, 0.04, 250);
        let (result, _) = solve(&stats, 0.0, true).unwrap();

        assert!((result.assets[0].full_kelly - 2.5).abs() < 1e-9);
        assert!((result.sharpe_ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_half_kelly_halves_sharpe_and_uses_it_for_growth() {
        let stats = single_asset(0.10, 0.04, 250);
        let (result, _) = solve(&stats, 0.05, false).unwrap();

        assert!((result.full_kelly_sharpe_ratio - 0.5).abs() < 1e-9);
        assert!((result.sharpe_ratio - 0.25).abs() < 1e-9);
        assert!((result.growth_rate - (0.05 + 0.25 * 0.25 / 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_max_growth_rate_known_values() {
        assert!((compute_max_growth_rate(0.05, 1.0) - 0.55).abs() < 1e-12);
        assert!((compute_max_growth_rate(0.03, 0.0) - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_half_of_full() {
        let f = DVector::from_vec(vec![2.0, -1.0, 0.5]);
        assert_eq!(compute_half_kelly(&f), DVector::from_vec(vec![1.0, -0.5, 0.25]));
    }

    #[test]
    fn test_two_asset_solution_satisfies_system() {
        let m = DVector::from_vec(vec![0.10, 0.06]);
        let c = DMatrix::from_row_slice(2, 2, &[0.04, 0.006, 0.006, 0.0225]);
        let stats = Statistics::new(vec!["A".into(), "B".into()], m.clone(), c.clone(), 252);

        let (result, _) = solve(&stats, 0.0, true).unwrap();
        let f = DVector::from_vec(result.full_kelly());
        let residual = &c * &f - &m;

        assert!(residual.amax() < 1e-12);
    }

    #[test]
    fn test_identical_assets_are_singular() {
        let m = DVector::from_vec(vec![0.1, 0.1]);
        let c = DMatrix::from_row_slice(2, 2, &[0.03, 0.03, 0.03, 0.03]);
        let stats = Statistics::new(vec!["A".into(), "B".into()], m, c, 100);

        assert!(matches!(
            solve(&stats, 0.05, false),
            Err(SingularMatrixError::Singular | SingularMatrixError::IllConditioned { .. })
        ));
    }

    #[test]
    fn test_empty_statistics() {
        let stats = Statistics::new(vec![], DVector::zeros(0), DMatrix::zeros(0, 0), 0);
        assert_eq!(solve(&stats, 0.05, false), Err(SingularMatrixError::Empty));
    }

    #[test]
    fn test_mismatched_statistics() {
        let stats = Statistics::new(
            vec!["A".into(), "B".into()],
            DVector::from_vec(vec![0.1, 0.1]),
            DMatrix::identity(3, 3),
            100,
        );
        assert!(matches!(
            solve(&stats, 0.05, false),
            Err(SingularMatrixError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_high_leverage_advisory_uses_recommended_leverage() {
        // Full Kelly 10, half Kelly 5
        let stats = single_asset(0.10, 0.01, 250);

        let (_, advisories) = solve(&stats, 0.05, false).unwrap();
        assert!(advisories.iter().any(|a| matches!(
            a,
            Advisory::HighLeverage { leverage, .. } if (*leverage - 5.0).abs() < 1e-9
        )));

        // Full Kelly 3 stays below the threshold of 4
        let stats = single_asset(0.09, 0.03, 250);
        let (_, advisories) = solve(&stats, 0.05, true).unwrap();
        assert!(!advisories
            .iter()
            .any(|a| matches!(a, Advisory::HighLeverage { .. })));
    }

    #[test]
    fn test_small_sample_advisory() {
        let (_, small) = solve(&single_asset(0.1, 0.04, 59), 0.0, false).unwrap();
        assert!(small
            .iter()
            .any(|a| matches!(a, Advisory::SmallSample { observations: 59, minimum: 60 })));

        let (_, enough) = solve(&single_asset(0.1, 0.04, 60), 0.0, false).unwrap();
        assert!(!enough
            .iter()
            .any(|a| matches!(a, Advisory::SmallSample { .. })));
    }

    #[test]
    fn test_disclaimers_always_present() {
        let (_, advisories) = solve(&single_asset(0.1, 0.04, 500), 0.0, false).unwrap();
        assert_eq!(advisories.len(), 3);
        assert!(advisories.contains(&Advisory::GaussianAssumption));
        assert!(advisories.contains(&Advisory::ContinuousRebalancing));
        assert!(advisories.contains(&Advisory::RegimeShift));
    }

    #[test]
    fn test_custom_thresholds() {
        let solver = KellySolver::new(SolverConfig {
            high_leverage_threshold: 1.0,
            min_observations: 10,
            ..SolverConfig::default()
        });

        let (_, advisories) = solver.solve(&single_asset(0.1, 0.04, 20), 0.0, true).unwrap();
        assert!(advisories
            .iter()
            .any(|a| matches!(a, Advisory::HighLeverage { .. })));
        assert!(!advisories
            .iter()
            .any(|a| matches!(a, Advisory::SmallSample { .. })));
    }
}
