//! Aligned price tables.

use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::types::AssetId;

/// Adjusted closing prices on a shared, strictly increasing date index.
///
/// Row `t` holds one price per asset for `dates[t]`, in `assets` order.
/// Every cell is finite and positive.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PriceMatrixData"))]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    assets: Vec<AssetId>,
    rows: Vec<Vec<f64>>,
}

/// Unvalidated wire form; deserialization goes through [`PriceMatrix::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct PriceMatrixData {
    dates: Vec<NaiveDate>,
    assets: Vec<AssetId>,
    rows: Vec<Vec<f64>>,
}

#[cfg(feature = "serde")]
impl TryFrom<PriceMatrixData> for PriceMatrix {
    type Error = Error;

    fn try_from(data: PriceMatrixData) -> Result<Self> {
        Self::new(data.dates, data.assets, data.rows)
    }
}

impl PriceMatrix {
    /// Build from already-aligned rows.
    pub fn new(dates: Vec<NaiveDate>, assets: Vec<AssetId>, rows: Vec<Vec<f64>>) -> Result<Self> {
        validate_assets(&assets)?;

        if dates.len() != rows.len() {
            return Err(Error::DimensionMismatch {
                expected: dates.len(),
                actual: rows.len(),
            });
        }
        if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(Error::InvalidParameter(format!(
                "dates must be strictly increasing: {} then {}",
                pair[0], pair[1]
            )));
        }

        for (t, row) in rows.iter().enumerate() {
            if row.len() != assets.len() {
                return Err(Error::DimensionMismatch {
                    expected: assets.len(),
                    actual: row.len(),
                });
            }
            for (j, &p) in row.iter().enumerate() {
                if !p.is_finite() || p <= 0.0 {
                    return Err(Error::InvalidPrice {
                        asset: assets[j].to_string(),
                        row: t,
                        value: p,
                    });
                }
            }
        }

        Ok(Self {
            dates,
            assets,
            rows,
        })
    }

    /// Inner-join per-asset series onto the dates every asset has a price for.
    ///
    /// Series may arrive unsorted and with different date coverage; dates missing
    /// from any asset are dropped. A date repeated within one series keeps the
    /// last price. Assets keep their input order.
    pub fn align<I, S>(series: I) -> Result<Self>
    where
        I: IntoIterator<Item = (AssetId, S)>,
        S: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut assets = Vec::new();
        let mut by_asset: Vec<FxHashMap<NaiveDate, f64>> = Vec::new();

        for (asset, points) in series {
            assets.push(asset);
            by_asset.push(points.into_iter().collect());
        }
        validate_assets(&assets)?;

        let Some((first, rest)) = by_asset.split_first() else {
            return Err(Error::InvalidParameter("no assets supplied".into()));
        };

        let mut dates: Vec<NaiveDate> = first
            .keys()
            .filter(|d| rest.iter().all(|m| m.contains_key(*d)))
            .copied()
            .collect();
        dates.sort_unstable();

        let dropped = first.len() - dates.len();
        if dropped > 0 {
            log::debug!("alignment dropped {dropped} dates not shared by all assets");
        }

        let rows = dates
            .iter()
            .map(|d| by_asset.iter().map(|m| m[d]).collect())
            .collect();

        Self::new(dates, assets, rows)
    }

    /// Sub-matrix over `assets`, in the order given.
    pub fn select(&self, assets: &[AssetId]) -> Result<Self> {
        let indices = assets
            .iter()
            .map(|a| {
                self.asset_index(a)
                    .ok_or_else(|| Error::InvalidParameter(format!("unknown asset: {a}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&j| row[j]).collect())
            .collect();

        Self::new(self.dates.clone(), assets.to_vec(), rows)
    }

    /// Every asset except `asset`, in the original order.
    pub fn without(&self, asset: &AssetId) -> Result<Self> {
        let keep: Vec<AssetId> = self.assets.iter().filter(|a| *a != asset).cloned().collect();
        if keep.len() == self.assets.len() {
            return Err(Error::InvalidParameter(format!("unknown asset: {asset}")));
        }
        self.select(&keep)
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

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_assets(&self) -> usize {
        self.assets.len()
    }

    pub fn asset_index(&self, asset: &AssetId) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }
}

pub(crate) fn validate_assets(assets: &[AssetId]) -> Result<()> {
    if assets.is_empty() {
        return Err(Error::InvalidParameter("no assets supplied".into()));
    }
    let mut seen = FxHashSet::default();
    for a in assets {
        if a.as_str().is_empty() {
            return Err(Error::InvalidParameter("empty asset id".into()));
        }
        if !seen.insert(a) {
            return Err(Error::InvalidParameter(format!("duplicate asset: {a}")));
        }
    }
    Ok(())
}
