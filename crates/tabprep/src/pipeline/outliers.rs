//! Outlier handling module.
//!
//! Clamps numeric columns to their IQR fences `[Q1 - k*IQR, Q3 + k*IQR]`.
//! Quartiles use linear interpolation between closest ranks.

use crate::types::{ClipBounds, ColumnClip, ColumnKind};
use crate::utils::{quantile_sorted, sorted_values};
use anyhow::Result;
use polars::prelude::*;
use tracing::{debug, warn};

/// Result of clipping a table.
#[derive(Debug, Clone)]
pub struct ClippingReport {
    pub data: DataFrame,
    /// One entry per numeric column that was clipped.
    pub clips: Vec<ColumnClip>,
    /// Numeric columns left as-is because their fences are not finite.
    pub skipped: Vec<String>,
}

/// Handles outlier detection and treatment.
pub struct OutlierHandler;

impl OutlierHandler {
    /// Compute IQR clip bounds for a numeric series.
    ///
    /// Returns `None` when the series has no non-null values.
    pub fn compute_bounds(series: &Series, k: f64) -> Result<Option<ClipBounds>> {
        let sorted = sorted_values(series)?;
        let (Some(q1), Some(q3)) = (quantile_sorted(&sorted, 0.25), quantile_sorted(&sorted, 0.75))
        else {
            return Ok(None);
        };
        Ok(Some(ClipBounds::from_quartiles(q1, q3, k)))
    }

    /// Count non-null values of a series lying outside `bounds`.
    pub fn count_outside(series: &Series, bounds: &ClipBounds) -> Result<usize> {
        let float_series = series.cast(&DataType::Float64)?;
        Ok(float_series
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| !bounds.contains(*v))
            .count())
    }

    /// Clip every numeric column of `df` to its IQR bounds.
    ///
    /// Bounds are computed per column from that column's current values.
    /// Categorical columns and columns without values are skipped. Columns
    /// whose fences are not finite (infinite values around the quartiles) are
    /// left unchanged and listed in [`ClippingReport::skipped`].
    pub fn clip_iqr(df: DataFrame, k: f64) -> Result<ClippingReport> {
        let mut df = df;
        let mut clips = Vec::new();
        let mut skipped = Vec::new();

        let numeric: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|col| ColumnKind::of_column(col).is_numeric())
            .map(|col| col.name().to_string())
            .collect();

        for name in numeric {
            let series = df.column(&name)?.as_materialized_series().clone();
            let Some(bounds) = Self::compute_bounds(&series, k)? else {
                debug!("Skipping outlier clipping for '{}': no values", name);
                continue;
            };
            if !bounds.is_finite() {
                warn!(
                    "Skipping outlier clipping for '{}': fences [{}, {}] are not finite",
                    name, bounds.lower, bounds.upper
                );
                skipped.push(name);
                continue;
            }

            let clipped = Self::count_outside(&series, &bounds)?;
            let float_series = series.cast(&DataType::Float64)?;
            let capped = float_series
                .f64()?
                .apply(|v| v.map(|val| bounds.clip(val)));
            df.replace(&name, capped.into_series())?;

            debug!(
                "Clipped {} values in '{}' to [{:.4}, {:.4}]",
                clipped, name, bounds.lower, bounds.upper
            );
            clips.push(ColumnClip {
                column: name,
                bounds,
                clipped,
            });
        }

        Ok(ClippingReport {
            data: df,
            clips,
            skipped,
        })
    }
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
    fn test_compute_bounds_linear_quartiles() {
        // Q1 = 3.25, Q3 = 7.75, IQR = 4.5
        let series = Series::new("v".into(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0]);
        let bounds = OutlierHandler::compute_bounds(&series, 1.5).unwrap().unwrap();

        assert!((bounds.q1 - 3.25).abs() < 1e-12);
        assert!((bounds.q3 - 7.75).abs() < 1e-12);
        assert!((bounds.iqr - 4.5).abs() < 1e-12);
        assert!((bounds.lower - (-3.5)).abs() < 1e-12);
        assert!((bounds.upper - 14.5).abs() < 1e-12);
    }

    #[test]
    fn test_clip_iqr_caps_extreme_value() {
        let df = df![
            "value" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0],
        ]
        .unwrap();

        let ClippingReport { data: df, clips, .. } = OutlierHandler::clip_iqr(df, 1.5).unwrap();

        // Capping keeps every row
        assert_eq!(df.height(), 10);
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].clipped, 1);
        let v = values(&df, "value");
        assert_eq!(v[9], 14.5);
        assert_eq!(&v[..9], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_clip_iqr_all_values_within_bounds() {
        let df = df![
            "a" => [-1000.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 1000.0],
            "b" => [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 1000.0],
        ]
        .unwrap();

        let before = df.clone();
        let ClippingReport { data: df, clips, .. } = OutlierHandler::clip_iqr(df, 1.5).unwrap();

        for clip in &clips {
            let original = before.column(&clip.column).unwrap().as_materialized_series();
            let expected = OutlierHandler::compute_bounds(original, 1.5).unwrap().unwrap();
            assert_eq!(clip.bounds, expected);
            assert!(values(&df, &clip.column).iter().all(|v| expected.contains(*v)));
        }
    }

    #[test]
    fn test_clip_iqr_constant_column() {
        // IQR = 0, bounds collapse onto the single value
        let df = df!["value" => [5.0, 5.0, 5.0, 5.0, 5.0]].unwrap();

        let ClippingReport { data: df, clips, .. } = OutlierHandler::clip_iqr(df, 1.5).unwrap();

        assert_eq!(clips[0].clipped, 0);
        assert_eq!(values(&df, "value"), vec![5.0; 5]);
    }

    #[test]
    fn test_clip_iqr_skips_categorical_columns() {
        let df = df!["category" => ["a", "b", "c", "d", "e"]].unwrap();

        let ClippingReport { data: df, clips, .. } = OutlierHandler::clip_iqr(df, 1.5).unwrap();

        assert!(clips.is_empty());
        assert_eq!(df.column("category").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_clip_iqr_keeps_nulls() {
        let df = df!["value" => [Some(1.0), None, Some(2.0), Some(50.0)]].unwrap();

        let df = OutlierHandler::clip_iqr(df, 1.5).unwrap().data;

        assert_eq!(df.column("value").unwrap().null_count(), 1);
    }

    #[test]
    fn test_clip_iqr_empty_dataframe() {
        let report = OutlierHandler::clip_iqr(DataFrame::empty(), 1.5).unwrap();
        assert_eq!(report.data.height(), 0);
        assert!(report.clips.is_empty());
    }

    #[test]
    fn test_clip_iqr_skips_infinite_fences() {
        // Both quartiles are infinite, so the IQR is NaN
        let df = df![
            "a" => [f64::INFINITY, f64::INFINITY, f64::INFINITY, 1.0],
            "b" => [1.0, 2.0, 3.0, 40.0],
        ]
        .unwrap();

        let report = OutlierHandler::clip_iqr(df, 1.5).unwrap();

        assert_eq!(report.skipped, vec!["a".to_string()]);
        assert_eq!(report.clips.len(), 1);
        assert_eq!(report.clips[0].column, "b");
        assert_eq!(
            values(&report.data, "a"),
            vec![f64::INFINITY, f64::INFINITY, f64::INFINITY, 1.0]
        );
    }

    #[test]
    fn test_clip_iqr_clamps_single_infinity() {
        let df = df!["v" => [1.0, 2.0, 3.0, 4.0, f64::INFINITY]].unwrap();

        let report = OutlierHandler::clip_iqr(df, 1.5).unwrap();

        assert!(report.skipped.is_empty());
        assert_eq!(report.clips[0].clipped, 1);
        assert_eq!(values(&report.data, "v")[4], report.clips[0].bounds.upper);
    }
}
