//! End-to-end pipeline: prices → returns → sampling + optimization → comparison.

use crate::benchmark::{BenchmarkComparison, benchmark_performance};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::optimize::{AllocationOptimizer, OptimizationResult};
use crate::prices::PriceMatrix;
use crate::returns::ReturnMatrix;
use crate::sampler::{SimulationResultSet, sample_portfolios};
use crate::solver::{Minimizer, SpectralProjectedGradient};
use crate::types::AssetId;

/// Everything the presentation layer needs from one run.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Analysis {
    pub config: AnalysisConfig,
    /// Returns of the investable universe (benchmark excluded).
    pub returns: ReturnMatrix,
    pub simulation: SimulationResultSet,
    pub optimum: OptimizationResult,
    /// Present only when a benchmark asset was named.
    pub benchmark: Option<BenchmarkComparison>,
}

impl Analysis {
    /// Run with the default solver.
    ///
    /// When `benchmark` names a column of `prices`, that column is removed from
    /// the investable universe and compared against the optimum.
    pub fn run(
        prices: &PriceMatrix,
        config: &AnalysisConfig,
        benchmark: Option<&AssetId>,
    ) -> Result<Self> {
        Self::run_with_solver(prices, config, benchmark, SpectralProjectedGradient::default())
    }

    pub fn run_with_solver<M: Minimizer>(
        prices: &PriceMatrix,
        config: &AnalysisConfig,
        benchmark: Option<&AssetId>,
        solver: M,
    ) -> Result<Self> {
        config.validate()?;

        let universe = match benchmark {
            Some(b) => prices.without(b)?,
            None => prices.clone(),
        };
        let returns = ReturnMatrix::from_prices(&universe)?;
        log::debug!(
            "analysis over {} assets, {} periods",
            returns.num_assets(),
            returns.num_periods()
        );

        let simulation = sample_portfolios(&returns, &config.monte_carlo())?;
        let optimum =
            AllocationOptimizer::with_solver(config.optimizer(), solver)?.max_sharpe(&returns)?;

        let benchmark = benchmark
            .map(|b| -> Result<BenchmarkComparison> {
                let column = prices.select(std::slice::from_ref(b))?;
                let bench_returns = ReturnMatrix::from_prices(&column)?;
                let bench =
                    benchmark_performance(&bench_returns, b, config.trading_days_per_year)?;
                BenchmarkComparison::new(
                    b.clone(),
                    optimum.performance,
                    bench,
                    config.risk_free_rate,
                )
            })
            .transpose()?;

        Ok(Self {
            config: config.clone(),
            returns,
            simulation,
            optimum,
            benchmark,
        })
    }
}
