//! Row-level cleaning operations.
//!
//! This module provides:
//! - Removing rows where every value is missing (null or NaN)
//! - Removing exact duplicate rows (first occurrence kept, order preserved)

use crate::utils::nan_to_null;
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// Row-level cleaner for the first and third pipeline stages.
pub struct DataCleaner;

impl DataCleaner {
    /// Drop rows whose every column value is missing.
    ///
    /// NaN cells in float columns are turned into nulls first, so later
    /// stages see a single missing marker. Rows with partial missingness are
    /// kept. Returns the filtered table and the number of rows removed.
    pub fn drop_empty_rows(&self, df: DataFrame) -> Result<(DataFrame, usize)> {
        if df.width() == 0 || df.height() == 0 {
            return Ok((df, 0));
        }

        let columns = df
            .get_columns()
            .iter()
            .map(|col| nan_to_null(col.as_materialized_series()).map(Column::from))
            .collect::<PolarsResult<Vec<_>>>()?;
        let df = DataFrame::new(columns)?;

        let before = df.height();
        let mut has_value = BooleanChunked::full("has_value".into(), false, before);
        for col in df.get_columns() {
            let not_null = col.as_materialized_series().is_not_null();
            has_value = &has_value | &not_null;
        }

        let df = df.filter(&has_value)?;
        let removed = before - df.height();
        debug!("Removed {} fully-empty rows", removed);

        Ok((df, removed))
    }

    /// Drop rows that duplicate an earlier row across all columns.
    ///
    /// The first occurrence is kept and surviving rows stay in input order.
    /// Returns the deduplicated table and the number of rows removed.
    pub fn remove_duplicates(&self, df: DataFrame) -> Result<(DataFrame, usize)> {
        if df.width() == 0 || df.height() < 2 {
            return Ok((df, 0));
        }

        let before = df.height();
        let df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
        let removed = before - df.height();
        debug!("Removed {} duplicate rows", removed);

        Ok((df, removed))
    }
}
