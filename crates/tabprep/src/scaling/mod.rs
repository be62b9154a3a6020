//! Z-score standardization of numeric columns.
//!
//! [`StandardScaler::fit_transform`] fits a mean and population standard
//! deviation per numeric column and rescales the table. The fitted
//! [`ScalerState`] is handed back to the caller so the same transformation can
//! be applied to future tables (e.g. at inference time).
//!
//! # Example
//!
//! ```rust,ignore
//! use tabprep::scaling::StandardScaler;
//! use tabprep::ZeroVariancePolicy;
//!
//! let (scaled, state) = StandardScaler::fit_transform(&train, ZeroVariancePolicy::PassThrough)?;
//! let scaled_test = state.transform(&test)?;
//! ```

use crate::config::ZeroVariancePolicy;
use crate::error::{PreprocessingError, Result};
use crate::types::ColumnKind;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Fitted statistics for one standardized column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnScaling {
    pub mean: f64,
    /// Population standard deviation (ddof = 0), never zero.
    pub std: f64,
}

impl ColumnScaling {
    #[inline]
    pub fn scale(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }

    #[inline]
    pub fn unscale(&self, value: f64) -> f64 {
        value * self.std + self.mean
    }
}

/// Fitted scaler state, owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    /// Standardized columns in table order.
    pub columns: Vec<(String, ColumnScaling)>,
    /// Numeric columns left unscaled (zero variance or no values).
    pub unscaled: Vec<String>,
    /// Numeric columns left unscaled because their mean or standard
    /// deviation is not finite (infinite values).
    #[serde(default)]
    pub non_finite: Vec<String>,
}

impl ScalerState {
    /// True when no numeric column was seen during fitting.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.unscaled.is_empty() && self.non_finite.is_empty()
    }

    /// Fitted statistics for a column, if it was standardized.
    pub fn get(&self, column: &str) -> Option<&ColumnScaling> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, scaling)| scaling)
    }

    /// Apply the fitted statistics to another table.
    ///
    /// Columns not in the state are left untouched. A fitted column missing
    /// from `df` is an error.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.map_columns(df, ColumnScaling::scale)
    }

    /// Undo [`transform`](Self::transform).
    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.map_columns(df, ColumnScaling::unscale)
    }

    fn map_columns(&self, df: &DataFrame, f: fn(&ColumnScaling, f64) -> f64) -> Result<DataFrame> {
        let mut out = df.clone();
        for (name, scaling) in &self.columns {
            let column = df
                .column(name)
                .map_err(|_| PreprocessingError::ColumnNotFound(name.clone()))?;
            let mapped = map_f64(column.as_materialized_series(), |v| f(scaling, v))?;
            out.replace(name, mapped)?;
        }
        Ok(out)
    }

    /// Serialize the state to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore a state from JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Standard (z-score) scaler.
pub struct StandardScaler;

impl StandardScaler {
    /// Fit mean and population standard deviation for one column.
    ///
    /// Returns `None` when the column has no non-null values.
    pub fn fit_column(series: &Series) -> PolarsResult<Option<(f64, f64)>> {
        let float_series = series.cast(&DataType::Float64)?;
        let values: Vec<f64> = float_series.f64()?.into_iter().flatten().collect();
        Ok(mean_std(&values))
    }

    /// Standardize every numeric column of `df`.
    ///
    /// Numeric columns are cast to Float64. A column with zero standard
    /// deviation is either passed through unscaled or rejected, depending on
    /// `policy`. A column without any value, or whose statistics are not
    /// finite, is always passed through. Categorical columns are left as-is.
    pub fn fit_transform(
        df: &DataFrame,
        policy: ZeroVariancePolicy,
    ) -> Result<(DataFrame, ScalerState)> {
        let mut state = ScalerState::default();
        let mut out = df.clone();

        for column in df.get_columns() {
            if ColumnKind::of_column(column) != ColumnKind::Numeric {
                continue;
            }
            let name = column.name().to_string();
            let series = column.as_materialized_series();

            match Self::fit_column(series)? {
                Some((mean, std)) if std > 0.0 && std.is_finite() => {
                    let scaling = ColumnScaling { mean, std };
                    debug!("Standardizing '{}' (mean={:.4}, std={:.4})", name, mean, std);
                    out.replace(&name, map_f64(series, |v| scaling.scale(v))?)?;
                    state.columns.push((name, scaling));
                }
                Some((mean, std)) if !mean.is_finite() || !std.is_finite() => {
                    warn!(
                        "Column '{}' has non-finite statistics (mean={}, std={}); left unscaled",
                        name, mean, std
                    );
                    out.replace(&name, series.cast(&DataType::Float64)?)?;
                    state.non_finite.push(name);
                }
                Some((mean, _)) => {
                    if policy == ZeroVariancePolicy::Fail {
                        return Err(PreprocessingError::ZeroVariance(name));
                    }
                    warn!("Column '{}' has zero variance (constant {}); left unscaled", name, mean);
                    out.replace(&name, series.cast(&DataType::Float64)?)?;
                    state.unscaled.push(name);
                }
                // No values at all (empty table or all-null column)
                None => {
                    debug!("Column '{}' has no values; left unscaled", name);
                    out.replace(&name, series.cast(&DataType::Float64)?)?;
                    state.unscaled.push(name);
                }
            }
        }

        Ok((out, state))
    }
}

/// Mean and population standard deviation of a slice.
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

/// Cast to Float64 and apply `f` to every non-null value.
fn map_f64(series: &Series, f: impl Fn(f64) -> f64) -> PolarsResult<Series> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series
        .f64()?
        .apply(|v| v.map(&f))
        .into_series())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(df: &DataFrame, name: &str) -> Vec<f64> {
        df.column(name)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn test_mean_std_population() {
        let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(mean, 5.0);
        assert_eq!(std, 2.0);
        assert!(mean_std(&[]).is_none());
    }

    #[test]
    fn test_fit_transform_zero_mean_unit_std() {
        let df = df![
            "a" => [1i64, 2, 3, 4, 100],
            "b" => [0.5, 1.5, -2.0, 8.0, 3.0],
            "label" => ["x", "y", "x", "y", "x"],
        ]
        .unwrap();

        let (scaled, state) =
            StandardScaler::fit_transform(&df, ZeroVariancePolicy::PassThrough).unwrap();

        for name in ["a", "b"] {
            let (mean, std) = mean_std(&values(&scaled, name)).unwrap();
            assert!(mean.abs() < 1e-9, "mean of {name} should be 0, got {mean}");
            assert!((std - 1.0).abs() < 1e-9, "std of {name} should be 1, got {std}");
        }
        assert_eq!(state.columns.len(), 2);
        assert!(state.unscaled.is_empty());
        // Categorical column untouched
        assert_eq!(scaled.column("label").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_zero_variance_pass_through() {
        let df = df!["const" => [7.0, 7.0, 7.0], "v" => [1.0, 2.0, 3.0]].unwrap();

        let (scaled, state) =
            StandardScaler::fit_transform(&df, ZeroVariancePolicy::PassThrough).unwrap();

        assert_eq!(values(&scaled, "const"), vec![7.0, 7.0, 7.0]);
        assert_eq!(state.unscaled, vec!["const".to_string()]);
        assert!(state.get("const").is_none());
        assert!(state.get("v").is_some());
        assert!(values(&scaled, "const").iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_zero_variance_fail() {
        let df = df!["const" => [7.0, 7.0, 7.0]].unwrap();

        let result = StandardScaler::fit_transform(&df, ZeroVariancePolicy::Fail);

        assert!(matches!(
            result.unwrap_err(),
            PreprocessingError::ZeroVariance(name) if name == "const"
        ));
    }

    #[test]
    fn test_non_finite_column_is_not_zero_variance() {
        let df = df![
            "inf" => [f64::INFINITY, f64::INFINITY, f64::INFINITY, 1.0],
            "nan" => [1.0, f64::NAN, 3.0, 5.0],
            "v" => [1.0, 2.0, 3.0, 4.0],
        ]
        .unwrap();

        // Not rejected even when zero variance is fatal
        let (scaled, state) = StandardScaler::fit_transform(&df, ZeroVariancePolicy::Fail).unwrap();

        assert_eq!(state.non_finite, vec!["inf".to_string(), "nan".to_string()]);
        assert!(state.unscaled.is_empty());
        assert!(state.get("v").is_some());
        assert_eq!(values(&scaled, "inf")[3], 1.0);
    }

    #[test]
    fn test_no_numeric_columns_is_noop() {
        let df = df!["s" => ["a", "b"]].unwrap();

        let (scaled, state) =
            StandardScaler::fit_transform(&df, ZeroVariancePolicy::PassThrough).unwrap();

        assert!(state.is_empty());
        assert!(scaled.equals(&df));
    }

    #[test]
    fn test_transform_and_inverse_on_new_table() {
        let train = df!["x" => [0.0, 10.0]].unwrap();
        let (_, state) =
            StandardScaler::fit_transform(&train, ZeroVariancePolicy::PassThrough).unwrap();

        let scaling = state.get("x").unwrap();
        assert_eq!(scaling.mean, 5.0);
        assert_eq!(scaling.std, 5.0);

        let test = df!["x" => [5.0, 15.0], "other" => [1, 2]].unwrap();
        let scaled = state.transform(&test).unwrap();
        assert_eq!(values(&scaled, "x"), vec![0.0, 2.0]);

        let restored = state.inverse_transform(&scaled).unwrap();
        assert_eq!(values(&restored, "x"), vec![5.0, 15.0]);
    }

    #[test]
    fn test_transform_missing_column() {
        let train = df!["x" => [0.0, 10.0]].unwrap();
        let (_, state) =
            StandardScaler::fit_transform(&train, ZeroVariancePolicy::PassThrough).unwrap();

        let other = df!["y" => [1.0]].unwrap();
        assert!(matches!(
            state.transform(&other).unwrap_err(),
            PreprocessingError::ColumnNotFound(_)
        ));
    }

    #[test]
    fn test_state_json_roundtrip() {
        let train = df!["x" => [1.0, 2.0, 3.0], "c" => [4.0, 4.0, 4.0]].unwrap();
        let (_, state) =
            StandardScaler::fit_transform(&train, ZeroVariancePolicy::PassThrough).unwrap();

        let restored = ScalerState::from_json(&state.to_json().unwrap()).unwrap();
        assert_eq!(state, restored);
    }
}
