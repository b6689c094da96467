//! Constrained nonlinear minimization.
//!
//! The optimizer talks to solvers through [`Minimizer`], so the algorithm is
//! swappable. The bundled [`SpectralProjectedGradient`] handles box bounds plus
//! at most one linear equality, which covers the long-only, fully-invested
//! feasible set `{0 ≤ w ≤ 1, Σ w = 1}`.
//!
//! # References
//!
//! - Birgin, Martínez, Raydan, "Nonmonotone spectral projected gradient methods
//!   on convex sets", SIAM J. Optim. 10(4), 2000.

use crate::error::{Error, Result};

/// A smooth scalar function to minimize.
pub trait Objective {
    fn value(&self, x: &[f64]) -> f64;

    /// Gradient at `x`, written into `out`.
    ///
    /// Defaults to central finite differences.
    fn gradient(&self, x: &[f64], out: &mut [f64]) {
        let mut shifted = x.to_vec();
        for i in 0..x.len() {
            let h = 1e-7 * x[i].abs().max(1.0);
            shifted[i] = x[i] + h;
            let up = self.value(&shifted);
            shifted[i] = x[i] - h;
            let down = self.value(&shifted);
            shifted[i] = x[i];
            out[i] = (up - down) / (2.0 * h);
        }
    }
}

/// Closure objectives with finite-difference gradients.
impl<F: Fn(&[f64]) -> f64> Objective for F {
    fn value(&self, x: &[f64]) -> f64 {
        self(x)
    }
}

/// Per-coordinate bounds `lower[i] ≤ x[i] ≤ upper[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    /// The same `[lower, upper]` on every coordinate.
    pub fn uniform(n: usize, lower: f64, upper: f64) -> Self {
        Self {
            lower: vec![lower; n],
            upper: vec![upper; n],
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    fn validate(&self, n: usize) -> Result<()> {
        if self.lower.len() != n || self.upper.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: self.lower.len().min(self.upper.len()),
            });
        }
        for (i, (l, u)) in self.lower.iter().zip(&self.upper).enumerate() {
            if !l.is_finite() || !u.is_finite() || l > u {
                return Err(Error::InvalidParameter(format!(
                    "bound {i} is empty or non-finite: [{l}, {u}]"
                )));
            }
        }
        Ok(())
    }
}

/// A linear equality `coefficients · x = target`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearEquality {
    pub coefficients: Vec<f64>,
    pub target: f64,
}

impl LinearEquality {
    /// `Σ x = 1`.
    pub fn sum_to_one(n: usize) -> Self {
        Self {
            coefficients: vec![1.0; n],
            target: 1.0,
        }
    }

    /// `coefficients · x - target`.
    pub fn violation(&self, x: &[f64]) -> f64 {
        dot(&self.coefficients, x) - self.target
    }
}

/// Why a solver stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    /// Projected-gradient residual fell below the tolerance.
    ProjectedGradient,
    /// Relative objective change, or the best first-order decrease still
    /// available, fell below `ftol`.
    ObjectiveStalled,
    /// Iteration budget exhausted.
    MaxIterations,
    /// Backtracking could not find a decrease.
    LineSearchFailed,
}

impl Termination {
    pub fn is_converged(self) -> bool {
        matches!(self, Termination::ProjectedGradient | Termination::ObjectiveStalled)
    }
}

/// Solver bookkeeping returned with every solution.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    pub iterations: usize,
    pub evaluations: usize,
    /// Final objective value.
    pub objective: f64,
    /// Final projected-gradient residual (infinity norm).
    pub residual: f64,
    pub termination: Termination,
}

/// Output of [`Minimizer::minimize`].
#[derive(Clone, Debug, PartialEq)]
pub struct Minimization {
    /// Last iterate; feasible by construction.
    pub solution: Vec<f64>,
    pub converged: bool,
    pub diagnostics: Diagnostics,
}

/// A constrained minimizer.
///
/// Structural problems (mismatched dimensions, empty bounds, unsupported
/// constraint sets) are errors. Running out of budget is not: it comes back
/// with `converged == false` and the caller decides.
pub trait Minimizer {
    fn minimize(
        &self,
        objective: &dyn Objective,
        initial_guess: &[f64],
        constraints: &[LinearEquality],
        bounds: &Bounds,
    ) -> Result<Minimization>;
}

/// Solver budget and tolerances.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig {
    pub max_iterations: usize,
    /// Stop when `‖P(x - ∇f) - x‖∞` is at most this.
    pub tolerance: f64,
    /// Stop when `|Δf| ≤ ftol · max(1, |f|)`.
    pub ftol: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-8,
            ftol: 1e-12,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::InvalidParameter("max_iterations must be >= 1".into()));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if !self.ftol.is_finite() || self.ftol < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "ftol must be non-negative and finite, got {}",
                self.ftol
            )));
        }
        Ok(())
    }
}

/// Spectral projected gradient with monotone Armijo backtracking.
///
/// Each iteration steps along `P(x - α∇f) - x`, where `P` is the Euclidean
/// projection onto the feasible set and `α` the Barzilai-Borwein step. Every
/// iterate is feasible, so bounds and the equality are never violated and no
/// renormalization is needed.
#[derive(Clone, Debug, Default)]
pub struct SpectralProjectedGradient {
    config: SolverConfig,
}

const ALPHA_MIN: f64 = 1e-10;
const ALPHA_MAX: f64 = 1e8;
const ARMIJO: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 60;
/// First step moves no coordinate by more than this fraction of `‖x‖∞`.
const INITIAL_STEP_FRACTION: f64 = 0.1;

impl SpectralProjectedGradient {
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}

impl Minimizer for SpectralProjectedGradient {
    fn minimize(
        &self,
        objective: &dyn Objective,
        initial_guess: &[f64],
        constraints: &[LinearEquality],
        bounds: &Bounds,
    ) -> Result<Minimization> {
        let n = initial_guess.len();
        if n == 0 {
            return Err(Error::InvalidParameter("initial guess is empty".into()));
        }
        bounds.validate(n)?;
        let equality = match constraints {
            [] => None,
            [c] => {
                if c.coefficients.len() != n {
                    return Err(Error::DimensionMismatch {
                        expected: n,
                        actual: c.coefficients.len(),
                    });
                }
                Some(c)
            }
            _ => {
                return Err(Error::InvalidParameter(format!(
                    "spectral projected gradient supports at most one equality, got {}",
                    constraints.len()
                )));
            }
        };
        let proj = |v: &[f64]| project(v, bounds, equality);

        let cfg = &self.config;
        let mut x = proj(initial_guess)?;
        let mut f = objective.value(&x);
        let mut g = vec![0.0; n];
        objective.gradient(&x, &mut g);
        let mut evaluations = 1;

        let mut residual = projected_residual(&x, &g, &proj)?;
        let mut alpha = initial_step(&x, &g, residual);
        let mut g_new = vec![0.0; n];
        let mut iterations = 0;

        let termination = loop {
            if residual <= cfg.tolerance {
                break Termination::ProjectedGradient;
            }
            if iterations >= cfg.max_iterations {
                break Termination::MaxIterations;
            }
            iterations += 1;

            let trial: Vec<f64> = x.iter().zip(&g).map(|(xi, gi)| xi - alpha * gi).collect();
            let d: Vec<f64> = proj(&trial)?
                .iter()
                .zip(&x)
                .map(|(p, xi)| p - xi)
                .collect();
            let slope = dot(&g, &d);

            // Backtrack along the feasible segment x + λd, λ ∈ (0, 1].
            let mut lambda = 1.0;
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let candidate: Vec<f64> =
                    x.iter().zip(&d).map(|(xi, di)| xi + lambda * di).collect();
                let fc = objective.value(&candidate);
                evaluations += 1;
                if fc.is_finite() && fc <= f + ARMIJO * lambda * slope {
                    accepted = Some((candidate, fc));
                    break;
                }
                lambda *= 0.5;
            }
            let Some((x_new, f_new)) = accepted else {
                // No decrease left to find above rounding noise.
                break if -slope <= cfg.ftol * f.abs().max(1.0) {
                    Termination::ObjectiveStalled
                } else {
                    Termination::LineSearchFailed
                };
            };

            objective.gradient(&x_new, &mut g_new);
            let s: Vec<f64> = x_new.iter().zip(&x).map(|(a, b)| a - b).collect();
            let y: Vec<f64> = g_new.iter().zip(&g).map(|(a, b)| a - b).collect();
            let sy = dot(&s, &y);
            alpha = if sy > 0.0 {
                (dot(&s, &s) / sy).clamp(ALPHA_MIN, ALPHA_MAX)
            } else {
                ALPHA_MAX
            };

            let change = (f - f_new).abs();
            x = x_new;
            f = f_new;
            std::mem::swap(&mut g, &mut g_new);
            residual = projected_residual(&x, &g, &proj)?;

            if change <= cfg.ftol * f.abs().max(1.0) {
                break if residual <= cfg.tolerance {
                    Termination::ProjectedGradient
                } else {
                    Termination::ObjectiveStalled
                };
            }
        };

        log::debug!(
            "spg stopped: {termination:?} after {iterations} iterations, f={f:.6e}, residual={residual:.3e}"
        );

        Ok(Minimization {
            solution: x,
            converged: termination.is_converged(),
            diagnostics: Diagnostics {
                iterations,
                evaluations,
                objective: f,
                residual,
                termination,
            },
        })
    }
}

/// `min(1/residual, c·‖x‖∞/‖g‖∞)`: the first trial point stays near the start.
fn initial_step(x: &[f64], g: &[f64], residual: f64) -> f64 {
    if !residual.is_finite() || residual <= 0.0 {
        return 1.0;
    }
    let mut alpha = 1.0 / residual;
    let g_norm = inf_norm(g);
    if g_norm > 0.0 && g_norm.is_finite() {
        let x_norm = inf_norm(x);
        let scale = if x_norm > 0.0 { x_norm } else { 1.0 };
        alpha = alpha.min(INITIAL_STEP_FRACTION * scale / g_norm);
    }
    alpha.clamp(ALPHA_MIN, ALPHA_MAX)
}

fn inf_norm(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |m, x| m.max(x.abs()))
}

/// `‖P(x - g) - x‖∞`: zero exactly at first-order stationary points.
fn projected_residual<P>(x: &[f64], g: &[f64], project: &P) -> Result<f64>
where
    P: Fn(&[f64]) -> Result<Vec<f64>>,
{
    if g.iter().any(|gi| !gi.is_finite()) {
        return Ok(f64::INFINITY);
    }
    let trial: Vec<f64> = x.iter().zip(g).map(|(xi, gi)| xi - gi).collect();
    Ok(project(&trial)?
        .iter()
        .zip(x)
        .map(|(p, xi)| (p - xi).abs())
        .fold(0.0, f64::max))
}

/// Euclidean projection onto `{l ≤ x ≤ u}` intersected with `{a · x = b}`.
///
/// The projection is `clamp(v - θa, l, u)` for the θ where the equality holds;
/// `a · clamp(v - θa, l, u)` is non-increasing in θ, so θ is found by bisection.
fn project(v: &[f64], bounds: &Bounds, equality: Option<&LinearEquality>) -> Result<Vec<f64>> {
    let clamp_at = |theta: f64, a: Option<&[f64]>| -> Vec<f64> {
        v.iter()
            .enumerate()
            .map(|(i, vi)| {
                let shift = a.map_or(0.0, |a| theta * a[i]);
                (vi - shift).clamp(bounds.lower[i], bounds.upper[i])
            })
            .collect()
    };

    let Some(eq) = equality else {
        return Ok(clamp_at(0.0, None));
    };
    let a = eq.coefficients.as_slice();
    let level = |theta: f64| dot(a, &clamp_at(theta, Some(a))) - eq.target;

    // Widen until the bracket straddles the target.
    let mut lo = -1.0;
    let mut hi = 1.0;
    let mut widenings = 0;
    while level(lo) < 0.0 || level(hi) > 0.0 {
        lo *= 2.0;
        hi *= 2.0;
        widenings += 1;
        if widenings > 200 {
            return Err(Error::InvalidParameter(
                "equality constraint cannot be met within bounds".into(),
            ));
        }
    }

    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if level(mid) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let mut x = clamp_at(0.5 * (lo + hi), Some(a));
    distribute_residual(&mut x, a, eq.target, bounds);
    Ok(x)
}

/// Push the leftover `b - a·x` from bisection onto coordinates with slack.
fn distribute_residual(x: &mut [f64], a: &[f64], target: f64, bounds: &Bounds) {
    let residual = target - dot(a, x);
    if residual == 0.0 {
        return;
    }
    for i in 0..x.len() {
        if a[i] == 0.0 {
            continue;
        }
        let step = residual / a[i];
        let moved = (x[i] + step).clamp(bounds.lower[i], bounds.upper[i]);
        if moved == x[i] + step {
            x[i] = moved;
            return;
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
