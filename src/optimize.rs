//! Long-only allocation optimizers.
//!
//! Both optimizers search the simplex `{0 ≤ w_i ≤ 1, Σ w_i = 1}`, handing the
//! bounds and the sum-to-one equality to a [`Minimizer`]. Outputs are either a converged, finite weight vector or an
//! error; an unconverged iterate is never returned as if it were optimal.

use crate::error::{Error, Result};
use crate::performance::{Performance, PerformanceEvaluator, TRADING_DAYS_PER_YEAR};
use crate::returns::ReturnMatrix;
use crate::solver::{
    Bounds, Diagnostics, LinearEquality, Minimization, Minimizer, Objective,
    SpectralProjectedGradient,
};
use crate::types::{AssetId, Weights, snap_to_simplex};

/// Objective value standing in for a division by zero volatility.
const DEGENERATE_PENALTY: f64 = 1e10;

/// Optimizer parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizerConfig {
    /// Annual risk-free rate subtracted in the Sharpe ratio.
    pub risk_free_rate: f64,
    /// Annualization factor.
    pub periods_per_year: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            periods_per_year: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.risk_free_rate.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        if !self.periods_per_year.is_finite() || self.periods_per_year <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "periods_per_year must be positive and finite, got {}",
                self.periods_per_year
            )));
        }
        Ok(())
    }
}

/// A solved allocation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationResult {
    pub assets: Vec<AssetId>,
    pub weights: Weights,
    /// Recomputed from `weights` with the evaluator, not taken from the solver.
    pub performance: Performance,
    /// `None` when the answer was trivial and no solver ran.
    pub diagnostics: Option<Diagnostics>,
}

impl OptimizationResult {
    /// `(asset, weight)` pairs in column order.
    pub fn allocation(&self) -> impl Iterator<Item = (&AssetId, f64)> {
        self.assets.iter().zip(self.weights.iter().copied())
    }
}

/// Negative Sharpe ratio with an analytic gradient.
struct NegativeSharpe<'a> {
    evaluator: &'a PerformanceEvaluator,
    annual_means: Vec<f64>,
    risk_free_rate: f64,
}

impl Objective for NegativeSharpe<'_> {
    fn value(&self, w: &[f64]) -> f64 {
        let perf = self.evaluator.evaluate_unchecked(w);
        let excess = perf.expected_return - self.risk_free_rate;
        if perf.volatility == 0.0 {
            return if excess > 0.0 {
                -DEGENERATE_PENALTY
            } else {
                DEGENERATE_PENALTY
            };
        }
        // Near-riskless points never score past the zero-volatility value.
        (-excess / perf.volatility).clamp(-DEGENERATE_PENALTY, DEGENERATE_PENALTY)
    }

    fn gradient(&self, w: &[f64], out: &mut [f64]) {
        let sigma_w = self.evaluator.covariance_times(w);
        let var: f64 = w.iter().zip(&sigma_w).map(|(a, b)| a * b).sum::<f64>().max(0.0);
        let excess = dot(&self.annual_means, w) - self.risk_free_rate;

        if var == 0.0 {
            // Riskless and profitable cannot be improved; otherwise climb the return.
            for (o, m) in out.iter_mut().zip(&self.annual_means) {
                *o = if excess > 0.0 { 0.0 } else { -m };
            }
            return;
        }

        let vol = var.sqrt();
        for ((o, m), sw) in out.iter_mut().zip(&self.annual_means).zip(&sigma_w) {
            // ∂S/∂w = μ/σ - e·Σw/σ³
            *o = -(m / vol - excess * sw / (var * vol));
        }
    }
}

/// Annualized portfolio variance.
struct Variance<'a> {
    evaluator: &'a PerformanceEvaluator,
}

impl Objective for Variance<'_> {
    fn value(&self, w: &[f64]) -> f64 {
        let sigma_w = self.evaluator.covariance_times(w);
        dot(w, &sigma_w)
    }

    fn gradient(&self, w: &[f64], out: &mut [f64]) {
        for (o, sw) in out.iter_mut().zip(self.evaluator.covariance_times(w)) {
            *o = 2.0 * sw;
        }
    }
}

/// Finds the maximum-Sharpe and minimum-volatility allocations.
///
/// Generic over the solver; the default is [`SpectralProjectedGradient`].
///
/// # Example
///
/// ```
/// use nanofolio::{AllocationOptimizer, AssetId, OptimizerConfig, ReturnMatrix};
///
/// let returns = ReturnMatrix::new(
///     vec![AssetId::new("A"), AssetId::new("B")],
///     vec![vec![0.010, 0.002], vec![-0.004, 0.006], vec![0.008, -0.001], vec![0.002, 0.004]],
/// )
/// .unwrap();
///
/// let optimizer = AllocationOptimizer::new(OptimizerConfig::default()).unwrap();
/// let best = optimizer.max_sharpe(&returns).unwrap();
/// let total: f64 = best.weights.iter().sum();
/// assert!((total - 1.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct AllocationOptimizer<M = SpectralProjectedGradient> {
    config: OptimizerConfig,
    solver: M,
}

impl AllocationOptimizer {
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        Self::with_solver(config, SpectralProjectedGradient::default())
    }
}

impl<M: Minimizer> AllocationOptimizer<M> {
    pub fn with_solver(config: OptimizerConfig, solver: M) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, solver })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Allocation maximizing `(expected_return - risk_free_rate) / volatility`.
    ///
    /// The negative Sharpe ratio is not convex when excess returns are
    /// negative, so the solver runs from the equal-weight portfolio and from
    /// every single-asset vertex, and the best converged run wins.
    pub fn max_sharpe(&self, returns: &ReturnMatrix) -> Result<OptimizationResult> {
        let evaluator = PerformanceEvaluator::new(returns, self.config.periods_per_year)?;
        let objective = NegativeSharpe {
            evaluator: &evaluator,
            annual_means: evaluator.annualized_means(),
            risk_free_rate: self.config.risk_free_rate,
        };
        let k = returns.num_assets();
        let mut starts = vec![Weights::equal(k)?];
        if k > 1 {
            for i in 0..k {
                starts.push(Weights::single(k, i)?);
            }
        }
        self.solve(returns, &evaluator, &objective, &starts)
    }

    /// Allocation minimizing volatility, started from equal weights.
    pub fn min_volatility(&self, returns: &ReturnMatrix) -> Result<OptimizationResult> {
        let evaluator = PerformanceEvaluator::new(returns, self.config.periods_per_year)?;
        let objective = Variance {
            evaluator: &evaluator,
        };
        let starts = [Weights::equal(returns.num_assets())?];
        self.solve(returns, &evaluator, &objective, &starts)
    }

    /// Minimize from each start and keep the converged run with the lowest
    /// objective. `starts[0]` is the one reported when nothing converges.
    fn solve(
        &self,
        returns: &ReturnMatrix,
        evaluator: &PerformanceEvaluator,
        objective: &dyn Objective,
        starts: &[Weights],
    ) -> Result<OptimizationResult> {
        let k = returns.num_assets();

        if k == 1 {
            let weights = Weights::single(1, 0)?;
            return Ok(OptimizationResult {
                assets: returns.assets().to_vec(),
                performance: evaluator.evaluate(&weights)?,
                weights,
                diagnostics: None,
            });
        }

        let constraints = [LinearEquality::sum_to_one(k)];
        let bounds = Bounds::uniform(k, 0.0, 1.0);
        let mut best: Option<Minimization> = None;
        let mut first_failure: Option<Minimization> = None;

        for start in starts {
            let run = self.solver.minimize(objective, start, &constraints, &bounds)?;
            let usable = run.converged
                && run.diagnostics.objective.is_finite()
                && run.solution.iter().all(|w| w.is_finite());
            if !usable {
                log::debug!(
                    "start {:?} did not converge: {:?}",
                    start.as_slice(),
                    run.diagnostics.termination
                );
                first_failure.get_or_insert(run);
                continue;
            }
            if best
                .as_ref()
                .is_none_or(|b| run.diagnostics.objective < b.diagnostics.objective)
            {
                best = Some(run);
            }
        }

        let Some(Minimization {
            solution,
            diagnostics,
            ..
        }) = best
        else {
            return Err(match first_failure {
                Some(run) => {
                    log::warn!(
                        "optimizer stopped without converging: {:?} after {} iterations (residual {:.3e})",
                        run.diagnostics.termination,
                        run.diagnostics.iterations,
                        run.diagnostics.residual
                    );
                    Error::OptimizationDidNotConverge {
                        last_iterate: run.solution,
                        tolerance: run.diagnostics.residual,
                        iterations: run.diagnostics.iterations,
                    }
                }
                None => Error::InvalidParameter("no starting point supplied".into()),
            });
        };

        // Iterates are feasible; this only removes floating-point residue.
        let weights = Weights::new(snap_to_simplex(solution))?;
        let performance = evaluator.evaluate(&weights)?;

        log::debug!(
            "optimum after {} iterations: return={:.4} volatility={:.4}",
            diagnostics.iterations,
            performance.expected_return,
            performance.volatility
        );

        Ok(OptimizationResult {
            assets: returns.assets().to_vec(),
            weights,
            performance,
            diagnostics: Some(diagnostics),
        })
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
