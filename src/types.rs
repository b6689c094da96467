//! Core types: AssetId, Weights

use std::fmt;
use std::ops::Deref;

use crate::error::{Error, Result};

/// Tolerance for the fully-invested constraint: weights must sum to 1 within this.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Asset identifier (ticker), e.g. `AssetId::new("AAPL")`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A long-only, fully-invested weight vector.
///
/// Every element lies in `[0, 1]` and the elements sum to 1 within
/// [`WEIGHT_TOLERANCE`]. Ordering follows the columns of the return matrix
/// the weights were produced for.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<f64>", into = "Vec<f64>"))]
pub struct Weights(Vec<f64>);

impl Weights {
    /// Validate and wrap a weight vector.
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::InvalidParameter("weight vector is empty".into()));
        }
        if let Some((i, w)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0 || **w > 1.0)
        {
            return Err(Error::InvalidParameter(format!(
                "weight {i} must be in [0, 1], got {w}"
            )));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(Error::InvalidParameter(format!(
                "weights must sum to 1, got {sum}"
            )));
        }
        Ok(Self(weights))
    }

    /// Equal-weight portfolio over `n` assets.
    pub fn equal(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidParameter("asset count must be >= 1".into()));
        }
        Ok(Self(vec![1.0 / n as f64; n]))
    }

    /// Full weight on asset `index` out of `n`.
    pub fn single(n: usize, index: usize) -> Result<Self> {
        if index >= n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: index + 1,
            });
        }
        let mut w = vec![0.0; n];
        w[index] = 1.0;
        Ok(Self(w))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

impl Deref for Weights {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl TryFrom<Vec<f64>> for Weights {
    type Error = Error;

    fn try_from(v: Vec<f64>) -> Result<Self> {
        Self::new(v)
    }
}

impl From<Weights> for Vec<f64> {
    fn from(w: Weights) -> Self {
        w.0
    }
}

/// Clamp into `[0, 1]` and rescale onto the simplex.
///
/// Only for removing rounding residue from an already-feasible iterate: the
/// input must be non-negative with a positive sum.
pub(crate) fn snap_to_simplex(mut w: Vec<f64>) -> Vec<f64> {
    for x in &mut w {
        *x = x.clamp(0.0, 1.0);
    }
    let sum: f64 = w.iter().sum();
    if sum > 0.0 {
        for x in &mut w {
            *x /= sum;
        }
    }
    w
}
