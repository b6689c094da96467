//! Portfolio-versus-benchmark comparison.

use crate::error::{Error, Result};
use crate::performance::{Performance, PerformanceEvaluator};
use crate::returns::ReturnMatrix;
use crate::types::{AssetId, Weights};

/// Headline comparison of a portfolio against a reference asset.
///
/// Sharpe fields are `±∞` for a riskless side; JSON serializers without an
/// infinity literal write those as `null`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BenchmarkComparison {
    pub benchmark: AssetId,
    pub portfolio: Performance,
    pub benchmark_performance: Performance,
    pub portfolio_sharpe: f64,
    pub benchmark_sharpe: f64,
    /// `portfolio.expected_return - benchmark.expected_return`
    pub excess_return: f64,
    /// `portfolio.volatility - benchmark.volatility`
    pub volatility_difference: f64,
}

impl BenchmarkComparison {
    /// Compare two records under the same risk-free rate.
    pub fn new(
        benchmark: AssetId,
        portfolio: Performance,
        benchmark_performance: Performance,
        risk_free_rate: f64,
    ) -> Result<Self> {
        Ok(Self {
            portfolio_sharpe: portfolio.sharpe(risk_free_rate)?,
            benchmark_sharpe: benchmark_performance.sharpe(risk_free_rate)?,
            excess_return: portfolio.expected_return - benchmark_performance.expected_return,
            volatility_difference: portfolio.volatility - benchmark_performance.volatility,
            benchmark,
            portfolio,
            benchmark_performance,
        })
    }

    pub fn outperforms(&self) -> bool {
        self.portfolio_sharpe > self.benchmark_sharpe
    }
}

/// Performance of holding `asset` alone, from its column in `returns`.
pub fn benchmark_performance(
    returns: &ReturnMatrix,
    asset: &AssetId,
    periods_per_year: f64,
) -> Result<Performance> {
    let index = returns
        .asset_index(asset)
        .ok_or_else(|| Error::InvalidParameter(format!("unknown benchmark asset: {asset}")))?;
    let weights = Weights::single(returns.num_assets(), index)?;
    PerformanceEvaluator::new(returns, periods_per_year)?.evaluate(&weights)
}
