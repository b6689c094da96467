//! # nanofolio
//!
//! Risk/return analytics for long-only, fully-invested asset allocations.
//!
//! ## Features
//!
//! - **Return series**: adjusted closes → simple period returns, sample covariance
//! - **Performance**: annualized expected return, volatility, Sharpe ratio
//! - **Monte Carlo**: seeded random exploration of the allocation simplex
//! - **Optimization**: maximum-Sharpe and minimum-volatility allocations through
//!   a pluggable constrained solver
//! - **Benchmarks**: compare an allocation against a reference asset
//!
//! ## Quick Start
//!
//! ```
//! use chrono::NaiveDate;
//! use nanofolio::{AnalysisConfig, Analysis, AssetId, PriceMatrix};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let prices = PriceMatrix::new(
//!     vec![day(2), day(3), day(4), day(5), day(8)],
//!     vec![AssetId::new("AAPL"), AssetId::new("MSFT")],
//!     vec![
//!         vec![185.0, 370.0],
//!         vec![184.3, 371.5],
//!         vec![186.1, 369.8],
//!         vec![187.0, 374.2],
//!         vec![188.4, 373.9],
//!     ],
//! )
//! .unwrap();
//!
//! let config = AnalysisConfig {
//!     num_portfolios: 1_000,
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//! let analysis = Analysis::run(&prices, &config, None).unwrap();
//!
//! assert_eq!(analysis.simulation.len(), 1_000);
//! let total: f64 = analysis.optimum.weights.iter().sum();
//! assert!((total - 1.0).abs() < 1e-9);
//! ```
//!
//! ## Evaluating a single allocation
//!
//! ```
//! use nanofolio::{AssetId, PerformanceEvaluator, ReturnMatrix};
//!
//! let returns = ReturnMatrix::new(
//!     vec![AssetId::new("A"), AssetId::new("B")],
//!     vec![vec![0.01, -0.002], vec![-0.004, 0.003], vec![0.006, 0.001]],
//! )
//! .unwrap();
//!
//! let perf = PerformanceEvaluator::daily(&returns).evaluate(&[0.6, 0.4]).unwrap();
//! assert!(perf.volatility > 0.0);
//! let sharpe = perf.sharpe(0.02).unwrap();
//! assert!(sharpe.is_finite());
//! ```
//!
//! ## Reproducible sampling
//!
//! The sampler never touches global random state. Pass a seed, or your own
//! generator:
//!
//! ```
//! use nanofolio::{AssetId, MonteCarloConfig, ReturnMatrix, sample_portfolios};
//!
//! let returns = ReturnMatrix::new(
//!     vec![AssetId::new("A"), AssetId::new("B"), AssetId::new("C")],
//!     vec![vec![0.01, -0.002, 0.004], vec![-0.004, 0.003, 0.001]],
//! )
//! .unwrap();
//!
//! let config = MonteCarloConfig { num_portfolios: 100, seed: Some(7), ..Default::default() };
//! let a = sample_portfolios(&returns, &config).unwrap();
//! let b = sample_portfolios(&returns, &config).unwrap();
//! assert_eq!(a, b);
//! ```

pub mod analysis;
pub mod benchmark;
pub mod config;
mod error;
pub mod optimize;
pub mod performance;
pub mod prices;
pub mod returns;
pub mod sampler;
pub mod solver;
mod types;

// Re-export public API
pub use analysis::Analysis;
pub use benchmark::{BenchmarkComparison, benchmark_performance};
pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use optimize::{AllocationOptimizer, OptimizationResult, OptimizerConfig};
pub use performance::{
    Performance, PerformanceEvaluator, TRADING_DAYS_PER_YEAR, evaluate, sharpe_ratio,
};
pub use prices::PriceMatrix;
pub use returns::ReturnMatrix;
pub use sampler::{
    MonteCarloConfig, Sample, SimulationResultSet, random_weights, sample_portfolios,
    sample_portfolios_with,
};
pub use solver::{
    Bounds, Diagnostics, LinearEquality, Minimization, Minimizer, Objective, SolverConfig,
    SpectralProjectedGradient, Termination,
};
pub use types::{AssetId, WEIGHT_TOLERANCE, Weights};
