//! Monte Carlo exploration of the long-only allocation space.
//!
//! Each sample draws `k` independent uniforms in `[0, 1)` and divides them by
//! their sum. The result always lies on the probability simplex, but the
//! distribution is **not** uniform over it: mass concentrates toward the
//! centroid (equal weights) and corners are under-sampled.
//!
//! Randomness is always an explicit [`Rng`]. [`sample_portfolios`] seeds a
//! [`StdRng`] from [`MonteCarloConfig::seed`] (entropy when `None`);
//! [`sample_portfolios_with`] takes the caller's generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::performance::{Performance, PerformanceEvaluator, TRADING_DAYS_PER_YEAR};
#[cfg(feature = "serde")]
use crate::prices::validate_assets;
use crate::returns::ReturnMatrix;
use crate::types::{AssetId, Weights};

/// Configuration for a Monte Carlo run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonteCarloConfig {
    /// Number of portfolios to sample; must be >= 1.
    pub num_portfolios: usize,
    /// Annualization factor.
    pub periods_per_year: f64,
    /// Seed for reproducible runs; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            num_portfolios: 10_000,
            periods_per_year: TRADING_DAYS_PER_YEAR,
            seed: None,
        }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_portfolios == 0 {
            return Err(Error::InvalidParameter(
                "num_portfolios must be >= 1, got 0".into(),
            ));
        }
        Ok(())
    }
}

/// One sampled allocation and its performance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    pub weights: Weights,
    pub performance: Performance,
}

/// Sampled allocations in draw order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "SimulationResultSetData"))]
pub struct SimulationResultSet {
    assets: Vec<AssetId>,
    samples: Vec<Sample>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct SimulationResultSetData {
    assets: Vec<AssetId>,
    samples: Vec<Sample>,
}

#[cfg(feature = "serde")]
impl TryFrom<SimulationResultSetData> for SimulationResultSet {
    type Error = Error;

    fn try_from(data: SimulationResultSetData) -> Result<Self> {
        validate_assets(&data.assets)?;
        if let Some(s) = data.samples.iter().find(|s| s.weights.len() != data.assets.len()) {
            return Err(Error::DimensionMismatch {
                expected: data.assets.len(),
                actual: s.weights.len(),
            });
        }
        Ok(Self {
            assets: data.assets,
            samples: data.samples,
        })
    }
}

impl SimulationResultSet {
    /// Column order of every sample's weights.
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Sample with the highest Sharpe ratio.
    ///
    /// Samples whose ratio is undefined (zero excess over zero volatility) are
    /// skipped. `None` if no sample has a defined ratio.
    pub fn max_sharpe(&self, risk_free_rate: f64) -> Option<&Sample> {
        self.samples
            .iter()
            .filter_map(|s| s.performance.sharpe(risk_free_rate).ok().map(|sr| (s, sr)))
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(s, _)| s)
    }

    /// Sample with the lowest volatility.
    pub fn min_volatility(&self) -> Option<&Sample> {
        self.samples
            .iter()
            .min_by(|a, b| a.performance.volatility.total_cmp(&b.performance.volatility))
    }
}

impl<'a> IntoIterator for &'a SimulationResultSet {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Sample portfolios with a generator seeded from `config.seed`.
pub fn sample_portfolios(
    returns: &ReturnMatrix,
    config: &MonteCarloConfig,
) -> Result<SimulationResultSet> {
    config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    sample_portfolios_with(returns, config, &mut rng)
}

/// Sample portfolios drawing from `rng`. `config.seed` is ignored.
pub fn sample_portfolios_with<R: Rng>(
    returns: &ReturnMatrix,
    config: &MonteCarloConfig,
    rng: &mut R,
) -> Result<SimulationResultSet> {
    config.validate()?;
    let evaluator = PerformanceEvaluator::new(returns, config.periods_per_year)?;
    let k = returns.num_assets();

    log::debug!(
        "sampling {} portfolios over {k} assets",
        config.num_portfolios
    );

    // Draws are sequential so the stream is identical with or without `parallel`.
    let draws = (0..config.num_portfolios)
        .map(|_| random_weights(k, rng))
        .collect::<Result<Vec<_>>>()?;

    let samples = evaluate_draws(&evaluator, draws)?;

    Ok(SimulationResultSet {
        assets: returns.assets().to_vec(),
        samples,
    })
}

/// Uniform draw + L1 normalization. Redraws the (practically impossible)
/// all-zero vector.
///
/// Fails with [`Error::InvalidParameter`] when `k == 0`.
pub fn random_weights<R: Rng>(k: usize, rng: &mut R) -> Result<Vec<f64>> {
    if k == 0 {
        return Err(Error::InvalidParameter(
            "cannot draw weights for zero assets".into(),
        ));
    }
    loop {
        let mut w: Vec<f64> = (0..k).map(|_| rng.r#gen::<f64>()).collect();
        let sum: f64 = w.iter().sum();
        if sum > 0.0 {
            for x in &mut w {
                *x /= sum;
            }
            return Ok(w);
        }
    }
}

#[cfg(not(feature = "parallel"))]
fn evaluate_draws(evaluator: &PerformanceEvaluator, draws: Vec<Vec<f64>>) -> Result<Vec<Sample>> {
    draws
        .into_iter()
        .map(|w| evaluate_draw(evaluator, w))
        .collect()
}

#[cfg(feature = "parallel")]
fn evaluate_draws(evaluator: &PerformanceEvaluator, draws: Vec<Vec<f64>>) -> Result<Vec<Sample>> {
    use rayon::prelude::*;

    draws
        .into_par_iter()
        .map(|w| evaluate_draw(evaluator, w))
        .collect()
}

fn evaluate_draw(evaluator: &PerformanceEvaluator, w: Vec<f64>) -> Result<Sample> {
    let performance = evaluator.evaluate(&w)?;
    Ok(Sample {
        weights: Weights::new(w)?,
        performance,
    })
}
