//! Annualized expected return, volatility, and the Sharpe ratio.
//!
//! Statistics follow the usual convention for daily data:
//!
//! - `expected_return = Σ mean(r_i) · w_i · periods_per_year`
//! - `volatility = sqrt(wᵀ · Σ · w · periods_per_year)` with `Σ` the sample
//!   covariance of period returns.

use crate::error::{Error, Result};
use crate::returns::ReturnMatrix;

/// Trading days per year, the default annualization factor.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annualized risk/return of one allocation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Performance {
    pub expected_return: f64,
    pub volatility: f64,
}

impl Performance {
    /// Sharpe ratio of this record. See [`sharpe_ratio`].
    pub fn sharpe(&self, risk_free_rate: f64) -> Result<f64> {
        sharpe_ratio(self, risk_free_rate)
    }
}

/// `(expected_return - risk_free_rate) / volatility`.
///
/// Zero volatility resolves by the sign of the excess return: `+∞` when
/// positive, `-∞` when negative. A zero excess over zero volatility is
/// [`Error::DegenerateRisk`], as is any non-finite input.
pub fn sharpe_ratio(performance: &Performance, risk_free_rate: f64) -> Result<f64> {
    let excess = performance.expected_return - risk_free_rate;
    let vol = performance.volatility;

    if !excess.is_finite() || !vol.is_finite() || vol < 0.0 {
        return Err(Error::DegenerateRisk {
            excess_return: excess,
            volatility: vol,
        });
    }

    if vol > 0.0 {
        Ok(excess / vol)
    } else if excess > 0.0 {
        Ok(f64::INFINITY)
    } else if excess < 0.0 {
        Ok(f64::NEG_INFINITY)
    } else {
        Err(Error::DegenerateRisk {
            excess_return: excess,
            volatility: vol,
        })
    }
}

/// Evaluates weight vectors against precomputed return statistics.
///
/// Means and covariance are computed once at construction; each evaluation is
/// then `O(k²)` in the asset count.
#[derive(Clone, Debug)]
pub struct PerformanceEvaluator {
    means: Vec<f64>,
    covariance: Vec<Vec<f64>>,
    periods_per_year: f64,
}

impl PerformanceEvaluator {
    pub fn new(returns: &ReturnMatrix, periods_per_year: f64) -> Result<Self> {
        if !periods_per_year.is_finite() || periods_per_year <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "periods_per_year must be positive and finite, got {periods_per_year}"
            )));
        }
        Ok(Self {
            means: returns.means(),
            covariance: returns.covariance(),
            periods_per_year,
        })
    }

    /// Evaluator using [`TRADING_DAYS_PER_YEAR`].
    pub fn daily(returns: &ReturnMatrix) -> Self {
        Self {
            means: returns.means(),
            covariance: returns.covariance(),
            periods_per_year: TRADING_DAYS_PER_YEAR,
        }
    }

    pub fn num_assets(&self) -> usize {
        self.means.len()
    }

    pub fn periods_per_year(&self) -> f64 {
        self.periods_per_year
    }

    /// Annualized per-asset mean returns.
    pub fn annualized_means(&self) -> Vec<f64> {
        self.means.iter().map(|m| m * self.periods_per_year).collect()
    }

    /// Annualized return and volatility of `weights`.
    pub fn evaluate(&self, weights: &[f64]) -> Result<Performance> {
        self.check_len(weights)?;
        Ok(self.evaluate_unchecked(weights))
    }

    /// Annualized portfolio variance `wᵀ Σ w · periods_per_year`, floored at zero.
    pub fn variance(&self, weights: &[f64]) -> Result<f64> {
        self.check_len(weights)?;
        Ok(self.variance_unchecked(weights))
    }

    /// Annualized `Σ w`, the building block of volatility gradients.
    pub(crate) fn covariance_times(&self, weights: &[f64]) -> Vec<f64> {
        self.covariance
            .iter()
            .map(|row| {
                row.iter().zip(weights).map(|(c, w)| c * w).sum::<f64>() * self.periods_per_year
            })
            .collect()
    }

    pub(crate) fn evaluate_unchecked(&self, weights: &[f64]) -> Performance {
        let expected_return = self
            .means
            .iter()
            .zip(weights)
            .map(|(m, w)| m * w)
            .sum::<f64>()
            * self.periods_per_year;

        Performance {
            expected_return,
            volatility: self.variance_unchecked(weights).sqrt(),
        }
    }

    fn variance_unchecked(&self, weights: &[f64]) -> f64 {
        let sigma_w = self.covariance_times(weights);
        let var: f64 = weights.iter().zip(&sigma_w).map(|(w, s)| w * s).sum();
        // Rounding can push a PSD quadratic form slightly negative.
        var.max(0.0)
    }

    fn check_len(&self, weights: &[f64]) -> Result<()> {
        if weights.len() != self.means.len() {
            return Err(Error::DimensionMismatch {
                expected: self.means.len(),
                actual: weights.len(),
            });
        }
        Ok(())
    }
}

/// One-shot evaluation with the default annualization factor.
pub fn evaluate(weights: &[f64], returns: &ReturnMatrix) -> Result<Performance> {
    PerformanceEvaluator::daily(returns).evaluate(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetId;

    fn returns() -> ReturnMatrix {
        ReturnMatrix::new(
            vec![AssetId::new("A"), AssetId::new("B")],
            vec![
                vec![0.010, 0.004],
                vec![-0.003, 0.006],
                vec![0.007, -0.001],
                vec![0.004, 0.003],
            ],
        )
        .unwrap()
    }

    #[test]
    fn single_asset_matches_column_stats() {
        let r = returns();
        let perf = evaluate(&[1.0, 0.0], &r).unwrap();

        let col = r.column(0).unwrap();
        let mean = col.iter().sum::<f64>() / col.len() as f64;
        let var = col.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (col.len() - 1) as f64;

        assert!((perf.expected_return - mean * 252.0).abs() < 1e-12);
        assert!((perf.volatility - (var * 252.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn return_is_linear_in_weights() {
        let r = returns();
        let a = evaluate(&[1.0, 0.0], &r).unwrap();
        let b = evaluate(&[0.0, 1.0], &r).unwrap();
        let mix = evaluate(&[0.3, 0.7], &r).unwrap();
        let expected = 0.3 * a.expected_return + 0.7 * b.expected_return;
        assert!((mix.expected_return - expected).abs() < 1e-12);
    }

    #[test]
    fn dimension_mismatch() {
        assert_eq!(
            evaluate(&[1.0], &returns()),
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn custom_annualization() {
        let r = returns();
        let monthly = PerformanceEvaluator::new(&r, 12.0).unwrap();
        let daily = PerformanceEvaluator::daily(&r);
        let w = [0.5, 0.5];
        let m = monthly.evaluate(&w).unwrap();
        let d = daily.evaluate(&w).unwrap();
        assert!((m.expected_return * 21.0 - d.expected_return).abs() < 1e-12);
        assert!(PerformanceEvaluator::new(&r, 0.0).is_err());
        assert!(PerformanceEvaluator::new(&r, f64::NAN).is_err());
    }

    #[test]
    fn zero_variance_asset_has_zero_volatility() {
        let r = ReturnMatrix::new(
            vec![AssetId::new("CASH"), AssetId::new("X")],
            vec![vec![0.0, 0.01], vec![0.0, -0.02], vec![0.0, 0.015]],
        )
        .unwrap();
        let perf = evaluate(&[1.0, 0.0], &r).unwrap();
        assert_eq!(perf.volatility, 0.0);
        assert_eq!(perf.expected_return, 0.0);
    }

    #[test]
    fn sharpe_cases() {
        let p = Performance {
            expected_return: 0.12,
            volatility: 0.2,
        };
        assert!((sharpe_ratio(&p, 0.02).unwrap() - 0.5).abs() < 1e-12);

        let riskless = Performance {
            expected_return: 0.05,
            volatility: 0.0,
        };
        assert_eq!(riskless.sharpe(0.02).unwrap(), f64::INFINITY);
        assert_eq!(riskless.sharpe(0.08).unwrap(), f64::NEG_INFINITY);
        assert!(matches!(
            riskless.sharpe(0.05),
            Err(Error::DegenerateRisk { .. })
        ));

        let nan = Performance {
            expected_return: f64::NAN,
            volatility: 0.1,
        };
        assert!(sharpe_ratio(&nan, 0.0).is_err());
    }
}
