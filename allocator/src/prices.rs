//! Wide price CSV loading.
//!
//! Layout: a header `date,<asset>,<asset>,...` followed by one row per date.
//! Dates are ISO (`YYYY-MM-DD`). An empty cell means the asset has no price
//! that day; such dates are dropped by [`PriceMatrix::align`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use nanofolio::{AssetId, PriceMatrix};

use crate::error::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load and align a price file.
pub fn load_prices(path: &Path) -> Result<PriceMatrix> {
    let file = File::open(path).map_err(|e| Error::PricesRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let prices = read_prices(file)?;
    log::info!(
        "loaded {}: {} assets, {} aligned dates",
        path.display(),
        prices.num_assets(),
        prices.num_rows()
    );
    Ok(prices)
}

/// Parse a wide price CSV from any reader.
pub fn read_prices<R: Read>(reader: R) -> Result<PriceMatrix> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    if headers.len() < 2 {
        return Err(Error::Prices(
            "header must be `date` followed by at least one asset column".into(),
        ));
    }
    let assets: Vec<AssetId> = headers.iter().skip(1).map(AssetId::new).collect();
    let mut series: Vec<Vec<(NaiveDate, f64)>> = vec![Vec::new(); assets.len()];

    for (i, record) in csv.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let line = i + 2;
        let date_field = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(date_field, DATE_FORMAT)
            .map_err(|e| Error::Prices(format!("line {line}: bad date {date_field:?}: {e}")))?;

        for (j, column) in series.iter_mut().enumerate() {
            let cell = record.get(j + 1).unwrap_or_default();
            if cell.is_empty() {
                continue;
            }
            let price: f64 = cell.parse().map_err(|_| {
                Error::Prices(format!(
                    "line {line}: bad price {cell:?} for {}",
                    assets[j]
                ))
            })?;
            column.push((date, price));
        }
    }

    Ok(PriceMatrix::align(assets.into_iter().zip(series))?)
}
