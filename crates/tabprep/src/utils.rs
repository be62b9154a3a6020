//! Shared utilities for the cleaning pipeline.
//!
//! Dtype checks, order statistics over plain `f64` slices, and null filling
//! helpers used by more than one stage.

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Owned column names of a DataFrame, in column order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// Order Statistics
// =============================================================================

/// Non-null, non-NaN values of a numeric Series as `f64`, sorted ascending.
pub fn sorted_values(series: &Series) -> PolarsResult<Vec<f64>> {
    let float_series = series.cast(&DataType::Float64)?;
    let mut values: Vec<f64> = float_series
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect();
    values.sort_by(|a, b| a.total_cmp(b));
    Ok(values)
}

/// Quantile of sorted values with linear interpolation between closest ranks.
///
/// `q` must be in `[0, 1]`; returns `None` for an empty slice or a `q` out of range.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let idx = pos.floor() as usize;
    let frac = pos - idx as f64;
    let a = sorted[idx];
    let b = sorted[(idx + 1).min(sorted.len() - 1)];
    // Exact ranks and equal neighbours stay exact, even at infinity
    if frac == 0.0 || a == b {
        return Some(a);
    }
    Some(a + (b - a) * frac)
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Most frequent non-null value of a Series, compared on its string form.
///
/// Ties are broken by first-encountered order.
pub fn string_mode(series: &Series) -> PolarsResult<Option<String>> {
    let str_series = series.cast(&DataType::String)?;
    let str_chunked = str_series.str()?;

    // value -> (count, first position)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (pos, val) in str_chunked.into_iter().enumerate() {
        if let Some(val) = val {
            counts.entry(val).or_insert((0, pos)).0 += 1;
        }
    }

    Ok(counts
        .into_iter()
        .max_by(|(_, (count_a, pos_a)), (_, (count_b, pos_b))| {
            count_a.cmp(count_b).then(pos_b.cmp(pos_a))
        })
        .map(|(val, _)| val.to_string()))
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Turn NaN cells of a float Series into nulls so they count as missing.
///
/// Other dtypes are returned unchanged. Infinities are kept.
pub fn nan_to_null(series: &Series) -> PolarsResult<Series> {
    let normalized = match series.dtype() {
        DataType::Float64 => series
            .f64()?
            .apply(|v| v.filter(|x| !x.is_nan()))
            .into_series(),
        DataType::Float32 => series
            .f32()?
            .apply(|v| v.filter(|x| !x.is_nan()))
            .into_series(),
        _ => series.clone(),
    };
    Ok(normalized)
}

/// Fill null values in a numeric Series, returning a new Float64 Series.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let float_series = series.cast(&DataType::Float64)?;
    let values: Vec<f64> = float_series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();

    Ok(Series::new(series.name().clone(), values))
}

/// Fill null values in a Series with a string, returning a new String Series.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let str_series = series.cast(&DataType::String)?;
    let values: Vec<&str> = str_series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();

    Ok(Series::new(series.name().clone(), values))
}

// =============================================================================
// Tests
// =============================================================================
