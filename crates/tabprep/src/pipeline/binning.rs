//! Derived bucket column for one designated numeric column.
//!
//! Buckets are equal-frequency: edges are the column's quantiles at `i / n`
//! for `n` labels. When two quantile edges coincide (heavily repeated values),
//! the binner falls back to `n` equal-width intervals between min and max.
//! Intervals are right-closed and the lowest value always lands in the first
//! bucket.

use crate::types::{BinningOutcome, BinningStrategy, ColumnKind};
use crate::utils::{quantile_sorted, sorted_values};
use anyhow::{Result, bail};
use polars::prelude::*;
use tracing::{debug, warn};

/// Relative adjustment applied to equal-width edges so the extremes fall
/// inside the outer intervals.
const EDGE_ADJUSTMENT: f64 = 0.001;

/// Result of binning a table.
#[derive(Debug, Clone)]
pub struct BinningReport {
    pub data: DataFrame,
    /// `None` when the source column was absent, categorical, or without values.
    pub outcome: Option<BinningOutcome>,
    pub warnings: Vec<String>,
}

/// Equal-frequency binner with an equal-width fallback.
pub struct Binner;

impl Binner {
    /// Quantile edges at `i / n_bins` for `i = 0..=n_bins`.
    ///
    /// Returns `None` when the edges are degenerate (two coincide) or there are
    /// no values.
    pub fn quantile_edges(sorted: &[f64], n_bins: usize) -> Option<Vec<f64>> {
        let edges: Vec<f64> = (0..=n_bins)
            .map(|i| quantile_sorted(sorted, i as f64 / n_bins as f64))
            .collect::<Option<_>>()?;

        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return None;
        }
        Some(edges)
    }

    /// `n_bins` equal-width intervals covering `[min, max]`.
    ///
    /// The first edge is lowered by 0.1% of the range. A zero range is widened
    /// by 0.1% of the value on each side (0.001 when the value is zero).
    pub fn equal_width_edges(min: f64, max: f64, n_bins: usize) -> Vec<f64> {
        if min == max {
            let pad = if min == 0.0 {
                EDGE_ADJUSTMENT
            } else {
                EDGE_ADJUSTMENT * min.abs()
            };
            return linspace(min - pad, max + pad, n_bins);
        }

        let mut edges = linspace(min, max, n_bins);
        edges[0] -= (max - min) * EDGE_ADJUSTMENT;
        edges
    }

    /// Index of the right-closed interval containing `value`.
    ///
    /// The first interval also contains its left edge. Values outside the
    /// edges map to `None`.
    pub fn assign(value: f64, edges: &[f64]) -> Option<usize> {
        let (&first, &last) = (edges.first()?, edges.last()?);
        if value.is_nan() || value < first || value > last {
            return None;
        }
        // First edge >= value; interval i is (edges[i], edges[i + 1]]
        let upper = edges.partition_point(|&edge| edge < value);
        Some(upper.saturating_sub(1).min(edges.len() - 2))
    }

    /// Append `output` to `df`, bucketing `source` into `labels`.
    ///
    /// A missing or categorical source column leaves the table unchanged. A
    /// source without any finite value gets an all-null bucket column.
    /// Edges come from the finite values; infinite cells get a null label.
    pub fn bin_column(
        df: DataFrame,
        source: &str,
        output: &str,
        labels: &[String],
    ) -> Result<BinningReport> {
        let mut df = df;
        let mut warnings = Vec::new();

        if labels.len() < 2 {
            bail!("at least two labels are required, got {}", labels.len());
        }

        let Ok(column) = df.column(source) else {
            debug!("Bin column '{}' not present; skipping", source);
            return Ok(BinningReport {
                data: df,
                outcome: None,
                warnings,
            });
        };

        if !ColumnKind::of_column(column).is_numeric() {
            let message = format!("Bin column '{}' is not numeric; skipping binning", source);
            warn!("{}", message);
            warnings.push(message);
            return Ok(BinningReport {
                data: df,
                outcome: None,
                warnings,
            });
        }

        let series = column.as_materialized_series().cast(&DataType::Float64)?;
        let (sorted, infinite): (Vec<f64>, Vec<f64>) =
            sorted_values(&series)?.into_iter().partition(|v| v.is_finite());
        let n_bins = labels.len();

        if !infinite.is_empty() {
            let message = format!(
                "Bin column '{}' has {} infinite values; they get no bucket",
                source,
                infinite.len()
            );
            warn!("{}", message);
            warnings.push(message);
        }

        let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
            let message = format!(
                "Bin column '{}' has no finite values; bucket column left empty",
                source
            );
            warn!("{}", message);
            warnings.push(message);
            let empty: Vec<Option<&str>> = vec![None; df.height()];
            df.with_column(Series::new(output.into(), empty))?;
            return Ok(BinningReport {
                data: df,
                outcome: None,
                warnings,
            });
        };

        let (strategy, edges) = match Self::quantile_edges(&sorted, n_bins) {
            Some(edges) => (BinningStrategy::Quantile, edges),
            None => {
                let message = format!(
                    "Quantile edges for '{}' are not unique; falling back to equal-width bins",
                    source
                );
                warn!("{}", message);
                warnings.push(message);
                (
                    BinningStrategy::EqualWidth,
                    Self::equal_width_edges(min, max, n_bins),
                )
            }
        };

        let mut counts = vec![0usize; n_bins];
        let bucket_labels: Vec<Option<&str>> = series
            .f64()?
            .into_iter()
            .map(|value| {
                let index = Self::assign(value?, &edges)?;
                counts[index] += 1;
                Some(labels[index].as_str())
            })
            .collect();

        df.with_column(Series::new(output.into(), bucket_labels))?;

        debug!(
            "Binned '{}' into '{}' using {:?} edges {:?}",
            source, output, strategy, edges
        );

        Ok(BinningReport {
            data: df,
            outcome: Some(BinningOutcome {
                source_column: source.to_string(),
                output_column: output.to_string(),
                strategy,
                edges,
                counts: labels.iter().cloned().zip(counts).collect(),
            }),
            warnings,
        })
    }
}

/// `n + 1` evenly spaced points from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    let step = (end - start) / n as f64;
    let mut points: Vec<f64> = (0..=n).map(|i| start + step * i as f64).collect();
    points[n] = end;
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels() -> Vec<String> {
        ["young", "medium", "old"].iter().map(|s| s.to_string()).collect()
    }

    fn bucket_values(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        df.column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_quantile_edges() {
        let sorted: Vec<f64> = (1..=7).map(f64::from).collect();
        let edges = Binner::quantile_edges(&sorted, 3).unwrap();
        assert_eq!(edges, vec![1.0, 3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_quantile_edges_degenerate() {
        assert!(Binner::quantile_edges(&[10.0, 10.0, 10.0, 10.0, 50.0, 90.0], 3).is_none());
        assert!(Binner::quantile_edges(&[], 3).is_none());
    }

    #[test]
    fn test_equal_width_edges() {
        let edges = Binner::equal_width_edges(0.0, 30.0, 3);
        assert_eq!(edges.len(), 4);
        assert!((edges[0] - (-0.03)).abs() < 1e-12);
        assert_eq!(&edges[1..], &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_equal_width_edges_constant_value() {
        let edges = Binner::equal_width_edges(5.0, 5.0, 2);
        assert!((edges[0] - 4.995).abs() < 1e-12);
        assert!((edges[2] - 5.005).abs() < 1e-12);

        let edges = Binner::equal_width_edges(0.0, 0.0, 2);
        assert!((edges[0] - (-0.001)).abs() < 1e-12);
        assert!((edges[2] - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_assign_right_closed() {
        let edges = [1.0, 3.0, 5.0, 7.0];
        assert_eq!(Binner::assign(1.0, &edges), Some(0));
        assert_eq!(Binner::assign(3.0, &edges), Some(0));
        assert_eq!(Binner::assign(3.5, &edges), Some(1));
        assert_eq!(Binner::assign(5.0, &edges), Some(1));
        assert_eq!(Binner::assign(7.0, &edges), Some(2));
        assert_eq!(Binner::assign(0.5, &edges), None);
        assert_eq!(Binner::assign(7.5, &edges), None);
    }

    #[test]
    fn test_bin_column_quantile_strategy() {
        let df = df!["age" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]].unwrap();

        let report = Binner::bin_column(df, "age", "age_bin", &labels()).unwrap();
        let outcome = report.outcome.unwrap();

        assert_eq!(outcome.strategy, BinningStrategy::Quantile);
        assert_eq!(
            bucket_values(&report.data, "age_bin"),
            some(&["young", "young", "young", "medium", "medium", "old", "old"])
        );
        assert_eq!(
            outcome.counts,
            vec![
                ("young".to_string(), 3),
                ("medium".to_string(), 2),
                ("old".to_string(), 2),
            ]
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_bin_column_falls_back_to_equal_width() {
        let df = df!["HouseAge" => [10.0, 10.0, 10.0, 10.0, 50.0, 90.0]].unwrap();

        let report = Binner::bin_column(df, "HouseAge", "HouseAge_bin", &labels()).unwrap();
        let outcome = report.outcome.unwrap();

        assert_eq!(outcome.strategy, BinningStrategy::EqualWidth);
        assert_eq!(outcome.distinct_labels(), 3);
        assert_eq!(
            bucket_values(&report.data, "HouseAge_bin"),
            some(&["young", "young", "young", "young", "medium", "old"])
        );
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_bin_column_infinite_values_get_no_bucket() {
        let df = df!["age" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, f64::INFINITY]].unwrap();

        let report = Binner::bin_column(df, "age", "age_bin", &labels()).unwrap();
        let outcome = report.outcome.unwrap();

        assert_eq!(outcome.strategy, BinningStrategy::Quantile);
        assert_eq!(outcome.edges, vec![1.0, 3.0, 5.0, 7.0]);
        let buckets = bucket_values(&report.data, "age_bin");
        assert_eq!(buckets[6], Some("old".to_string()));
        assert_eq!(buckets[7], None);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_bin_column_appended_last_and_source_unchanged() {
        let df = df![
            "HouseAge" => [3i64, 1, 2],
            "other" => ["a", "b", "c"],
        ]
        .unwrap();
        let before = df.column("HouseAge").unwrap().as_materialized_series().clone();

        let report = Binner::bin_column(df, "HouseAge", "HouseAge_bin", &labels()).unwrap();

        let names: Vec<String> = report
            .data
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["HouseAge", "other", "HouseAge_bin"]);
        assert!(
            report
                .data
                .column("HouseAge")
                .unwrap()
                .as_materialized_series()
                .equals(&before)
        );
        assert_eq!(
            report.data.column("HouseAge_bin").unwrap().dtype(),
            &DataType::String
        );
    }

    #[test]
    fn test_bin_column_null_input_gives_null_label() {
        let df = df!["age" => [Some(1.0), None, Some(2.0), Some(3.0)]].unwrap();

        let report = Binner::bin_column(df, "age", "age_bin", &labels()).unwrap();

        let values = bucket_values(&report.data, "age_bin");
        assert_eq!(values[1], None);
        assert_eq!(values.iter().filter(|v| v.is_some()).count(), 3);
    }

    #[test]
    fn test_bin_column_missing_source_is_noop() {
        let df = df!["x" => [1.0, 2.0]].unwrap();

        let report = Binner::bin_column(df.clone(), "HouseAge", "HouseAge_bin", &labels()).unwrap();

        assert!(report.outcome.is_none());
        assert!(report.data.equals(&df));
    }

    #[test]
    fn test_bin_column_categorical_source_skipped() {
        let df = df!["HouseAge" => ["new", "old"]].unwrap();

        let report = Binner::bin_column(df, "HouseAge", "HouseAge_bin", &labels()).unwrap();

        assert!(report.outcome.is_none());
        assert_eq!(report.data.width(), 1);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_bin_column_without_values() {
        let df = df!["HouseAge" => Vec::<f64>::new()].unwrap();

        let report = Binner::bin_column(df, "HouseAge", "HouseAge_bin", &labels()).unwrap();

        assert!(report.outcome.is_none());
        assert_eq!(report.data.width(), 2);
        assert_eq!(report.data.height(), 0);
    }

    #[test]
    fn test_bin_column_rejects_single_label() {
        let df = df!["age" => [1.0, 2.0]].unwrap();
        let result = Binner::bin_column(df, "age", "age_bin", &["only".to_string()]);
        assert!(result.is_err());
    }
}
