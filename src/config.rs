//! Analysis configuration.

use crate::error::{Error, Result};
use crate::optimize::OptimizerConfig;
use crate::performance::TRADING_DAYS_PER_YEAR;
use crate::sampler::MonteCarloConfig;

/// Parameters recognized by the analytics core.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisConfig {
    /// Monte Carlo sample count.
    pub num_portfolios: usize,
    /// Annual risk-free rate for Sharpe ratios.
    pub risk_free_rate: f64,
    /// Seed for the sampler; `None` draws from OS entropy.
    pub random_seed: Option<u64>,
    /// Annualization factor.
    pub trading_days_per_year: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            num_portfolios: 10_000,
            risk_free_rate: 0.02,
            random_seed: None,
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl AnalysisConfig {
    /// Reject values no stage could run with.
    pub fn validate(&self) -> Result<()> {
        if self.num_portfolios == 0 {
            return Err(Error::InvalidParameter(
                "num_portfolios must be >= 1, got 0".into(),
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        if !self.trading_days_per_year.is_finite() || self.trading_days_per_year <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "trading_days_per_year must be positive and finite, got {}",
                self.trading_days_per_year
            )));
        }
        Ok(())
    }

    pub fn monte_carlo(&self) -> MonteCarloConfig {
        MonteCarloConfig {
            num_portfolios: self.num_portfolios,
            periods_per_year: self.trading_days_per_year,
            seed: self.random_seed,
        }
    }

    pub fn optimizer(&self) -> OptimizerConfig {
        OptimizerConfig {
            risk_free_rate: self.risk_free_rate,
            periods_per_year: self.trading_days_per_year,
        }
    }
}
