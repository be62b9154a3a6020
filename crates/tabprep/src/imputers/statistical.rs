//! Statistical imputation methods.
//!
//! Each column is imputed by a pure transform that returns a new column; the
//! table is then recomposed from the new columns. Columns never read each
//! other, so the order they are processed in does not matter.

use crate::types::{ColumnKind, FillValue, ImputationStats};
use crate::utils::{fill_numeric_nulls, fill_string_nulls, nan_to_null, string_mode};
use anyhow::Result;
use polars::prelude::*;
use tracing::{debug, warn};

/// Result of imputing a whole table.
#[derive(Debug, Clone)]
pub struct ImputationReport {
    pub data: DataFrame,
    /// One entry per column that had missing values and was filled.
    pub stats: Vec<ImputationStats>,
    /// Columns that had missing values but no statistic (every value null).
    pub skipped: Vec<String>,
}

/// Statistical imputation for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Compute the fill value for a column from its non-null values.
    ///
    /// Returns `None` when the column has no non-null value, or when the
    /// median itself is NaN (infinities of both signs).
    pub fn fill_value(series: &Series) -> Result<Option<FillValue>> {
        let fill = match ColumnKind::of(series.dtype()) {
            ColumnKind::Numeric => nan_to_null(series)?
                .median()
                .filter(|median| !median.is_nan())
                .map(FillValue::Median),
            ColumnKind::Categorical => string_mode(series)?.map(FillValue::Mode),
        };
        Ok(fill)
    }

    /// Impute one column, returning the filled copy.
    ///
    /// NaN cells count as missing. Returns `None` when the column has no
    /// missing values or no statistic can be computed for it. Numeric columns
    /// come back as Float64 (a median of integers may be fractional);
    /// categorical columns come back as String.
    pub fn impute_column(series: &Series) -> Result<Option<(Series, ImputationStats)>> {
        let series = &nan_to_null(series)?;
        let missing = series.null_count();
        if missing == 0 {
            return Ok(None);
        }

        let Some(fill_value) = Self::fill_value(series)? else {
            return Ok(None);
        };

        let filled = match &fill_value {
            FillValue::Median(median) => fill_numeric_nulls(series, *median)?,
            FillValue::Mode(mode) => fill_string_nulls(series, mode)?,
        };

        let stats = ImputationStats {
            column: series.name().to_string(),
            fill_value,
            filled: missing,
        };
        Ok(Some((filled, stats)))
    }

    /// Impute every column with missing values and compose a new table.
    pub fn impute_frame(df: &DataFrame) -> Result<ImputationReport> {
        let mut columns: Vec<Column> = Vec::with_capacity(df.width());
        let mut stats = Vec::new();
        let mut skipped = Vec::new();

        for column in df.get_columns() {
            let series = nan_to_null(column.as_materialized_series())?;
            match Self::impute_column(&series)? {
                Some((filled, column_stats)) => {
                    debug!(
                        "Imputed '{}': {} values with {}",
                        column_stats.column, column_stats.filled, column_stats.fill_value
                    );
                    stats.push(column_stats);
                    columns.push(Column::from(filled));
                }
                None => {
                    if series.null_count() > 0 {
                        warn!(
                            "Column '{}' has no usable fill value; leaving it unfilled",
                            series.name()
                        );
                        skipped.push(series.name().to_string());
                    }
                    columns.push(Column::from(series));
                }
            }
        }

        let data = if columns.is_empty() {
            df.clone()
        } else {
            DataFrame::new(columns)?
        };

        Ok(ImputationReport {
            data,
            stats,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_numeric_median_fill() {
        let df = df![
            "values" => [Some(1.0), None, Some(3.0), None, Some(10.0)],
        ]
        .unwrap();

        let report = StatisticalImputer::impute_frame(&df).unwrap();

        assert_eq!(report.data.column("values").unwrap().null_count(), 0);
        assert_eq!(
            f64_values(&report.data, "values"),
            vec![Some(1.0), Some(3.0), Some(3.0), Some(3.0), Some(10.0)]
        );
        assert_eq!(report.stats.len(), 1);
        assert_eq!(report.stats[0].fill_value, FillValue::Median(3.0));
        assert_eq!(report.stats[0].filled, 2);
    }

    #[test]
    fn test_integer_median_is_fractional() {
        let df = df!["n" => [Some(1i64), Some(2), None, Some(3), Some(4)]].unwrap();

        let report = StatisticalImputer::impute_frame(&df).unwrap();

        assert_eq!(report.data.column("n").unwrap().dtype(), &DataType::Float64);
        assert_eq!(f64_values(&report.data, "n")[2], Some(2.5));
    }

    #[test]
    fn test_categorical_mode_fill() {
        let df = df![
            "color" => [Some("red"), None, Some("blue"), Some("red"), None],
        ]
        .unwrap();

        let report = StatisticalImputer::impute_frame(&df).unwrap();

        let values: Vec<Option<&str>> = report
            .data
            .column("color")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            values,
            vec![Some("red"), Some("red"), Some("blue"), Some("red"), Some("red")]
        );
        assert_eq!(report.stats[0].fill_value, FillValue::Mode("red".to_string()));
    }

    #[test]
    fn test_categorical_mode_tie_uses_first_encountered() {
        let df = df!["c" => [Some("b"), Some("a"), None, Some("a"), Some("b")]].unwrap();

        let report = StatisticalImputer::impute_frame(&df).unwrap();

        assert_eq!(report.stats[0].fill_value, FillValue::Mode("b".to_string()));
    }

    #[test]
    fn test_columns_without_missing_values_untouched() {
        let df = df![
            "a" => [1i32, 2, 3],
            "b" => [Some(1.0), None, Some(2.0)],
        ]
        .unwrap();

        let report = StatisticalImputer::impute_frame(&df).unwrap();

        // Column "a" keeps its dtype, only "b" was imputed
        assert_eq!(report.data.column("a").unwrap().dtype(), &DataType::Int32);
        assert_eq!(report.stats.len(), 1);
        assert_eq!(report.stats[0].column, "b");
        // Column order is preserved
        assert_eq!(
            report.data.get_column_names(),
            df.get_column_names()
        );
    }

    #[test]
    fn test_all_null_column_is_skipped() {
        let df = df![
            "empty" => [None::<f64>, None, None],
            "ok" => [1.0, 2.0, 3.0],
        ]
        .unwrap();

        let report = StatisticalImputer::impute_frame(&df).unwrap();

        assert!(report.stats.is_empty());
        assert_eq!(report.skipped, vec!["empty".to_string()]);
        assert_eq!(report.data.column("empty").unwrap().null_count(), 3);
    }

    #[test]
    fn test_impute_column_is_pure() {
        let series = Series::new("v".into(), &[Some(2.0), None, Some(4.0)]);
        let (filled, _) = StatisticalImputer::impute_column(&series).unwrap().unwrap();

        assert_eq!(series.null_count(), 1);
        assert_eq!(filled.null_count(), 0);
    }

    #[test]
    fn test_nan_cells_are_imputed_with_median() {
        let df = df![
            "a" => [1.0, f64::NAN, 3.0, 5.0],
            "b" => [1.0, 2.0, 3.0, 4.0],
        ]
        .unwrap();

        let report = StatisticalImputer::impute_frame(&df).unwrap();

        assert_eq!(
            f64_values(&report.data, "a"),
            vec![Some(1.0), Some(3.0), Some(3.0), Some(5.0)]
        );
        assert_eq!(report.stats.len(), 1);
        assert_eq!(report.stats[0].column, "a");
        assert_eq!(report.stats[0].fill_value, FillValue::Median(3.0));
        assert_eq!(report.stats[0].filled, 1);
    }

    #[test]
    fn test_all_nan_column_is_skipped_as_nulls() {
        let df = df!["nan" => [f64::NAN, f64::NAN]].unwrap();

        let report = StatisticalImputer::impute_frame(&df).unwrap();

        assert_eq!(report.skipped, vec!["nan".to_string()]);
        assert_eq!(report.data.column("nan").unwrap().null_count(), 2);
    }

    #[test]
    fn test_impute_empty_dataframe() {
        let report = StatisticalImputer::impute_frame(&DataFrame::empty()).unwrap();
        assert_eq!(report.data.width(), 0);
        assert!(report.stats.is_empty());
    }
}
