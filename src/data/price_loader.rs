//! CSV loading for daily price files
//!
//! Expected layout is one row per date and one column per ticker:
//!
//! ```text
//! date,AAPL,MSFT
//! 2024-01-02,185.64,370.87
//! 2024-01-03,184.25,
//! ```
//!
//! Empty cells are missing prices; they are resolved when the series are
//! aligned.

use chrono::NaiveDate;
use polars::prelude::*;
use std::path::Path;

use super::history::{PriceHistory, PriceSeries};
use crate::error::DataError;

/// Name of the date column (case-insensitive)
const DATE_COLUMN: &str = "date";

/// Date format used in price files
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load one price series per ticker column
pub fn load_price_series<P: AsRef<Path>>(csv_path: P) -> Result<Vec<PriceSeries>, DataError> {
    let path = csv_path.as_ref();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(load_error)?
        .finish()
        .map_err(load_error)?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let date_name = names
        .iter()
        .find(|name| name.eq_ignore_ascii_case(DATE_COLUMN))
        .ok_or_else(|| DataError::Load(format!("{:?} has no '{}' column", path, DATE_COLUMN)))?;

    let dates = parse_dates(&df, date_name)?;

    let mut series = Vec::with_capacity(names.len().saturating_sub(1));
    for name in names.iter().filter(|name| *name != date_name) {
        let raw = df.column(name).map_err(load_error)?;
        let column = raw.cast(&DataType::Float64).map_err(load_error)?;
        let prices = column.f64().map_err(load_error)?;

        // Cells that were present but did not parse as numbers
        if column.null_count() > raw.null_count() {
            return Err(invalid_cell(raw, prices, name, &dates));
        }

        let points: Vec<(NaiveDate, f64)> = dates
            .iter()
            .enumerate()
            .filter_map(|(i, date)| prices.get(i).map(|price| (*date, price)))
            .collect();

        series.push(PriceSeries::new(name.trim(), points));
    }

    if series.is_empty() {
        return Err(DataError::NoAssets);
    }

    tracing::debug!("Loaded {} price columns from {:?}", series.len(), path);

    Ok(series)
}

/// Load a price file and align its columns onto common dates
pub fn load_price_csv<P: AsRef<Path>>(csv_path: P) -> Result<PriceHistory, DataError> {
    PriceHistory::align(load_price_series(csv_path)?)
}

fn parse_dates(df: &DataFrame, date_name: &str) -> Result<Vec<NaiveDate>, DataError> {
    let column = df
        .column(date_name)
        .and_then(|c| c.cast(&DataType::String))
        .map_err(load_error)?;
    let values = column.str().map_err(load_error)?;

    let mut dates = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let raw = values.get(i).unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|_| DataError::InvalidDate(raw.to_string()))?;
        dates.push(date);
    }

    Ok(dates)
}

/// Describe the first cell lost when casting a price column to numbers
fn invalid_cell(
    raw: &Column,
    prices: &Float64Chunked,
    name: &str,
    dates: &[NaiveDate],
) -> DataError {
    let text = match raw.cast(&DataType::String) {
        Ok(text) => text,
        Err(err) => return load_error(err),
    };
    let cells = match text.str() {
        Ok(cells) => cells,
        Err(err) => return load_error(err),
    };

    let bad = (0..prices.len()).find_map(|i| match (prices.get(i), cells.get(i)) {
        (None, Some(cell)) => Some((i, cell.to_string())),
        _ => None,
    });

    match bad {
        Some((i, cell)) => DataError::Load(format!(
            "Invalid price {:?} for {} on {}",
            cell,
            name.trim().to_uppercase(),
            dates[i]
        )),
        None => DataError::Load(format!(
            "Non-numeric prices in column {}",
            name.trim().to_uppercase()
        )),
    }
}

fn load_error(err: PolarsError) -> DataError {
    DataError::Load(err.to_string())
}
