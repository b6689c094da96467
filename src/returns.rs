//! Period returns and their column statistics.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::prices::{PriceMatrix, validate_assets};
use crate::types::AssetId;

/// Simple period returns, one row per price change.
///
/// Cell `(t, j)` is `(p[t+1] - p[t]) / p[t]` for asset `j`. Columns follow the
/// price matrix the returns were built from.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "ReturnMatrixData"))]
pub struct ReturnMatrix {
    /// Date at the end of each return period; empty for synthetic matrices.
    dates: Vec<NaiveDate>,
    assets: Vec<AssetId>,
    rows: Vec<Vec<f64>>,
}

/// Unvalidated wire form; deserialization goes through the same checks as
/// [`ReturnMatrix::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct ReturnMatrixData {
    #[serde(default)]
    dates: Vec<NaiveDate>,
    assets: Vec<AssetId>,
    rows: Vec<Vec<f64>>,
}

#[cfg(feature = "serde")]
impl TryFrom<ReturnMatrixData> for ReturnMatrix {
    type Error = Error;

    fn try_from(data: ReturnMatrixData) -> Result<Self> {
        Self::from_parts(data.dates, data.assets, data.rows)
    }
}

impl ReturnMatrix {
    /// Convert prices to simple returns. The first price row has no prior and
    /// produces no return.
    pub fn from_prices(prices: &PriceMatrix) -> Result<Self> {
        if prices.num_rows() < 2 {
            return Err(Error::InsufficientData {
                required: 2,
                actual: prices.num_rows(),
            });
        }

        let rows = prices
            .rows()
            .windows(2)
            .map(|pair| {
                pair[0]
                    .iter()
                    .zip(&pair[1])
                    .map(|(prev, cur)| (cur - prev) / prev)
                    .collect()
            })
            .collect();

        Ok(Self {
            dates: prices.dates()[1..].to_vec(),
            assets: prices.assets().to_vec(),
            rows,
        })
    }

    /// Wrap return rows that were computed elsewhere.
    pub fn new(assets: Vec<AssetId>, rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_parts(Vec::new(), assets, rows)
    }

    /// `dates` is either empty or one strictly increasing date per row.
    fn from_parts(dates: Vec<NaiveDate>, assets: Vec<AssetId>, rows: Vec<Vec<f64>>) -> Result<Self> {
        validate_assets(&assets)?;
        if !dates.is_empty() {
            if dates.len() != rows.len() {
                return Err(Error::DimensionMismatch {
                    expected: rows.len(),
                    actual: dates.len(),
                });
            }
            if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
                return Err(Error::InvalidParameter(format!(
                    "dates must be strictly increasing: {} then {}",
                    pair[0], pair[1]
                )));
            }
        }
        if rows.is_empty() {
            return Err(Error::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        for row in &rows {
            if row.len() != assets.len() {
                return Err(Error::DimensionMismatch {
                    expected: assets.len(),
                    actual: row.len(),
                });
            }
            if row.iter().any(|r| !r.is_finite()) {
                return Err(Error::InvalidParameter("returns must be finite".into()));
            }
        }
        Ok(Self {
            dates,
            assets,
            rows,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn num_periods(&self) -> usize {
        self.rows.len()
    }

    pub fn num_assets(&self) -> usize {
        self.assets.len()
    }

    pub fn asset_index(&self, asset: &AssetId) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    /// Returns of a single asset, in period order. `None` if `index` is out of
    /// range.
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.assets.len() {
            return None;
        }
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    /// Arithmetic mean per column.
    pub fn means(&self) -> Vec<f64> {
        let n = self.rows.len() as f64;
        let mut sums = vec![0.0; self.assets.len()];
        for row in &self.rows {
            for (s, v) in sums.iter_mut().zip(row) {
                *s += v;
            }
        }
        sums.into_iter().map(|s| s / n).collect()
    }

    /// Sample covariance matrix (denominator `n - 1`, clamped to 1).
    pub fn covariance(&self) -> Vec<Vec<f64>> {
        let cols = self.assets.len();
        let means = self.means();
        let mut cov = vec![vec![0.0; cols]; cols];

        for row in &self.rows {
            for i in 0..cols {
                let di = row[i] - means[i];
                for j in i..cols {
                    cov[i][j] += di * (row[j] - means[j]);
                }
            }
        }

        let denom = (self.rows.len() as f64 - 1.0).max(1.0);
        for i in 0..cols {
            for j in i..cols {
                let v = cov[i][j] / denom;
                cov[i][j] = v;
                cov[j][i] = v;
            }
        }

        cov
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn prices() -> PriceMatrix {
        PriceMatrix::new(
            vec![d(1), d(4), d(5)],
            vec![AssetId::new("A"), AssetId::new("B")],
            vec![vec![100.0, 50.0], vec![110.0, 50.0], vec![99.0, 55.0]],
        )
        .unwrap()
    }

    #[test]
    fn pct_change() {
        let r = ReturnMatrix::from_prices(&prices()).unwrap();
        assert_eq!(r.num_periods(), 2);
        assert_eq!(r.dates(), &[d(4), d(5)]);
        assert!((r.rows()[0][0] - 0.10).abs() < 1e-15);
        assert_eq!(r.rows()[0][1], 0.0);
        assert!((r.rows()[1][0] + 0.10).abs() < 1e-15);
        assert!((r.rows()[1][1] - 0.10).abs() < 1e-15);
        assert_eq!(r.assets(), prices().assets());
    }

    #[test]
    fn single_row_is_insufficient() {
        let p = PriceMatrix::new(vec![d(1)], vec![AssetId::new("A")], vec![vec![10.0]]).unwrap();
        assert_eq!(
            ReturnMatrix::from_prices(&p),
            Err(Error::InsufficientData {
                required: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn new_validates() {
        let a = vec![AssetId::new("A"), AssetId::new("B")];
        assert!(ReturnMatrix::new(a.clone(), vec![]).is_err());
        assert!(ReturnMatrix::new(a.clone(), vec![vec![0.1]]).is_err());
        assert!(ReturnMatrix::new(a, vec![vec![0.1, f64::INFINITY]]).is_err());
    }

    #[test]
    fn sample_covariance() {
        let r = ReturnMatrix::new(
            vec![AssetId::new("A"), AssetId::new("B")],
            vec![vec![1.0, 2.0], vec![3.0, 0.0], vec![5.0, 4.0]],
        )
        .unwrap();

        assert_eq!(r.means(), vec![3.0, 2.0]);

        // var(A) = (4 + 0 + 4) / 2, var(B) = (0 + 4 + 4) / 2, cov = (0 + 0 + 4) / 2
        let cov = r.covariance();
        assert_eq!(cov, vec![vec![4.0, 2.0], vec![2.0, 4.0]]);
    }

    #[test]
    fn column_extracts_asset() {
        let r = ReturnMatrix::from_prices(&prices()).unwrap();
        let b = r.column(r.asset_index(&AssetId::new("B")).unwrap()).unwrap();
        assert_eq!(b[0], 0.0);
        assert!((b[1] - 0.1).abs() < 1e-15);
        assert_eq!(r.column(2), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_goes_through_validation() {
        let r = ReturnMatrix::from_prices(&prices()).unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(serde_json::from_str::<ReturnMatrix>(&json).unwrap(), r);

        let synthetic = r#"{"assets":["A","B"],"rows":[[0.01,0.02]]}"#;
        assert!(serde_json::from_str::<ReturnMatrix>(synthetic).is_ok());

        let ragged = r#"{"dates":[],"assets":["A","B"],"rows":[[0.01],[0.02,0.03]]}"#;
        assert!(serde_json::from_str::<ReturnMatrix>(ragged).is_err());

        let empty = r#"{"assets":["A"],"rows":[]}"#;
        assert!(serde_json::from_str::<ReturnMatrix>(empty).is_err());

        let short_dates = r#"{"dates":["2024-03-04"],"assets":["A"],"rows":[[0.01],[0.02]]}"#;
        assert!(serde_json::from_str::<ReturnMatrix>(short_dates).is_err());

        let unordered = r#"{"dates":["2024-03-05","2024-03-04"],"assets":["A"],"rows":[[0.01],[0.02]]}"#;
        assert!(serde_json::from_str::<ReturnMatrix>(unordered).is_err());
    }
}
