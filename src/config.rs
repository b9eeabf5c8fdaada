//! Annualization and solver settings
//!
//! Every constant that turns daily figures into annual ones, and every
//! threshold the solver checks, lives here.

use serde::{Deserialize, Serialize};

/// Trading days per year used for annualization
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Condition number above which the covariance solve is refused
pub const DEFAULT_MAX_CONDITION_NUMBER: f64 = 1e12;

/// Per-asset leverage magnitude that triggers a high-leverage advisory
pub const DEFAULT_HIGH_LEVERAGE_THRESHOLD: f64 = 4.0;

/// Return observations below which estimates are flagged as unreliable
pub const DEFAULT_MIN_OBSERVATIONS: usize = 60;

/// How an annual risk-free rate is turned into a per-period rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFreeConvention {
    /// `annual / periods`
    #[default]
    Simple,
    /// `(1 + annual)^(1 / periods) - 1`
    Compounded,
}

impl RiskFreeConvention {
    /// Per-period rate for an annual rate
    pub fn periodic_rate(&self, annual_rate: f64, periods_per_year: f64) -> f64 {
        match self {
            RiskFreeConvention::Simple => annual_rate / periods_per_year,
            RiskFreeConvention::Compounded => (1.0 + annual_rate).powf(1.0 / periods_per_year) - 1.0,
        }
    }
}

/// Annualization settings for the return estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualizationConfig {
    /// Return periods per year (252 for daily prices)
    pub periods_per_year: f64,
    /// Risk-free conversion convention
    pub risk_free: RiskFreeConvention,
}

impl AnnualizationConfig {
    pub fn new(periods_per_year: f64, risk_free: RiskFreeConvention) -> Self {
        Self {
            periods_per_year,
            risk_free,
        }
    }

    /// Daily risk-free rate for an annual rate
    pub fn daily_risk_free(&self, annual_rate: f64) -> f64 {
        self.risk_free.periodic_rate(annual_rate, self.periods_per_year)
    }

    /// Scale a per-period moment (mean or covariance entry) to a year
    pub fn annualize(&self, value: f64) -> f64 {
        value * self.periods_per_year
    }
}

impl Default for AnnualizationConfig {
    fn default() -> Self {
        Self {
            periods_per_year: TRADING_DAYS_PER_YEAR,
            risk_free: RiskFreeConvention::Simple,
        }
    }
}

/// Kelly solver thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Largest accepted covariance condition number
    pub max_condition_number: f64,
    /// |leverage| above this raises an advisory
    pub high_leverage_threshold: f64,
    /// Sample size below this raises an advisory
    pub min_observations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_condition_number: DEFAULT_MAX_CONDITION_NUMBER,
            high_leverage_threshold: DEFAULT_HIGH_LEVERAGE_THRESHOLD,
            min_observations: DEFAULT_MIN_OBSERVATIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_daily_rate() {
        let config = AnnualizationConfig::default();
        assert!((config.daily_risk_free(0.0252) - 0.0001).abs() < 1e-12);
    }

    #[test]
    fn test_compounded_daily_rate() {
        let config = AnnualizationConfig::new(TRADING_DAYS_PER_YEAR, RiskFreeConvention::Compounded);
        let daily = config.daily_risk_free(0.05);

        // Compounding the daily rate back over a year recovers the annual rate
        let annual = (1.0 + daily).powf(TRADING_DAYS_PER_YEAR) - 1.0;
        assert!((annual - 0.05).abs() < 1e-12);
        assert!(daily < 0.05 / TRADING_DAYS_PER_YEAR);
    }

    #[test]
    fn test_zero_rate_is_zero_for_both_conventions() {
        assert_eq!(RiskFreeConvention::Simple.periodic_rate(0.0, 252.0), 0.0);
        assert_eq!(RiskFreeConvention::Compounded.periodic_rate(0.0, 252.0), 0.0);
    }

    #[test]
    fn test_annualize() {
        let config = AnnualizationConfig::default();
        assert!((config.annualize(0.0004) - 0.1008).abs() < 1e-12);
    }

    #[test]
    fn test_solver_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.min_observations, 60);
        assert!((config.high_leverage_threshold - 4.0).abs() < f64::EPSILON);
        assert!(config.max_condition_number > 1e6);
    }
}
