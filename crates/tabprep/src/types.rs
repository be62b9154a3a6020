//! Shared data types for the cleaning pipeline.

use crate::scaling::ScalerState;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Column Kinds
// ============================================================================

/// Declared value kind of a column.
///
/// Every type-aware decision in the pipeline (imputation statistic, whether a
/// column is standardized and clipped) goes through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point values
    Numeric,
    /// Anything else (text, booleans, dates, categoricals)
    Categorical,
}

impl ColumnKind {
    /// Classify a polars dtype.
    pub fn of(dtype: &DataType) -> Self {
        if crate::utils::is_numeric_dtype(dtype) {
            Self::Numeric
        } else {
            Self::Categorical
        }
    }

    /// Classify a column by its dtype.
    pub fn of_column(column: &Column) -> Self {
        Self::of(column.dtype())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric)
    }
}

// ============================================================================
// Column Statistic Set
// ============================================================================

/// Statistic used to fill the missing values of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FillValue {
    /// Median of the non-null values of a numeric column.
    Median(f64),
    /// Most frequent non-null value of a categorical column.
    Mode(String),
}

impl std::fmt::Display for FillValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Median(v) => write!(f, "median {v}"),
            Self::Mode(v) => write!(f, "mode '{v}'"),
        }
    }
}

/// Imputation record for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationStats {
    pub column: String,
    pub fill_value: FillValue,
    /// Number of null values replaced.
    pub filled: usize,
}

/// IQR clip bounds computed for one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ClipBounds {
    /// Derive bounds `[q1 - k*iqr, q3 + k*iqr]` from the two quartiles.
    pub fn from_quartiles(q1: f64, q3: f64, k: f64) -> Self {
        let iqr = q3 - q1;
        Self {
            q1,
            q3,
            iqr,
            lower: q1 - k * iqr,
            upper: q3 + k * iqr,
        }
    }

    /// Both fences are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite()
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Clamp `value` into the fences. Only meaningful when
    /// [`is_finite`](Self::is_finite) holds.
    pub fn clip(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }
}

/// Clip record for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnClip {
    pub column: String,
    pub bounds: ClipBounds,
    /// Number of values moved onto a bound.
    pub clipped: usize,
}

// ============================================================================
// Binning
// ============================================================================

/// Strategy that produced the derived bucket column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinningStrategy {
    /// Equal-frequency edges taken from the column's quantiles.
    Quantile,
    /// Equal-width edges, used when quantile edges collapse.
    EqualWidth,
}

/// Outcome of binning the designated column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinningOutcome {
    pub source_column: String,
    pub output_column: String,
    pub strategy: BinningStrategy,
    /// `labels.len() + 1` ascending edges; intervals are right-closed.
    pub edges: Vec<f64>,
    /// Row count per label, in label order.
    pub counts: Vec<(String, usize)>,
}

impl BinningOutcome {
    /// Number of labels that received at least one row.
    pub fn distinct_labels(&self) -> usize {
        self.counts.iter().filter(|(_, n)| *n > 0).count()
    }
}

// ============================================================================
// Pipeline Result
// ============================================================================

/// Everything a pipeline run produces.
///
/// The first three fields are the pipeline contract: the cleaned table, the
/// fitted scaler state (owned by the caller for reuse on future tables), and
/// the path of the written file when persistence was enabled.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub data: DataFrame,
    pub scaler: ScalerState,
    pub saved_path: Option<PathBuf>,
    /// `None` when the bin column was absent or not numeric.
    pub binning: Option<BinningOutcome>,
    pub summary: PreprocessingSummary,
}

// ============================================================================
// Preprocessing Summary
// ============================================================================

/// Human-readable record of what a pipeline run did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessingSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Number of rows before cleaning.
    pub rows_before: usize,
    /// Number of rows after cleaning.
    pub rows_after: usize,
    /// Fully-empty rows dropped in the first stage.
    pub empty_rows_removed: usize,
    /// Duplicate rows dropped.
    pub duplicates_removed: usize,

    /// Number of columns before cleaning.
    pub columns_before: usize,
    /// Number of columns after cleaning (includes the derived bucket column).
    pub columns_after: usize,

    /// Per-column imputation records.
    pub imputations: Vec<ImputationStats>,
    /// Per-column clip records.
    pub clips: Vec<ColumnClip>,

    /// Ordered list of actions taken.
    pub actions: Vec<PreprocessingAction>,

    /// Warnings and notes (recovered degeneracies).
    pub warnings: Vec<String>,
}

impl PreprocessingSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action to the summary.
    pub fn add_action(&mut self, action: PreprocessingAction) {
        self.actions.push(action);
    }

    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Total rows removed by all stages.
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    /// Calculate the percentage of rows removed.
    pub fn rows_removed_percentage(&self) -> f32 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_removed() as f32 / self.rows_before as f32) * 100.0
        }
    }

    /// Total number of imputed cells.
    pub fn values_imputed(&self) -> usize {
        self.imputations.iter().map(|s| s.filled).sum()
    }

    /// Total number of clipped cells.
    pub fn values_clipped(&self) -> usize {
        self.clips.iter().map(|c| c.clipped).sum()
    }
}

/// A single action taken during cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingAction {
    /// Type of action performed.
    pub action_type: ActionType,
    /// Target of the action (column name or "dataset").
    pub target: String,
    /// Human-readable description of the action.
    pub description: String,
    /// Additional details (e.g., statistic used).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl PreprocessingAction {
    /// Create a new action.
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
            details: None,
        }
    }

    /// Add details to the action.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Types of actions taken during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Fully-empty rows were removed.
    RowsRemoved,
    /// Missing values were imputed.
    ValueImputed,
    /// Duplicate rows were removed.
    DuplicatesRemoved,
    /// Numeric columns were standardized.
    DataNormalized,
    /// Outliers were clipped.
    OutlierHandled,
    /// A derived bucket column was added.
    ColumnBinned,
    /// The cleaned table was written to disk.
    DatasetSaved,
}

impl ActionType {
    /// Get a human-readable display name for the action type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::RowsRemoved => "Rows Removed",
            Self::ValueImputed => "Value Imputed",
            Self::DuplicatesRemoved => "Duplicates Removed",
            Self::DataNormalized => "Data Normalized",
            Self::OutlierHandled => "Outlier Handled",
            Self::ColumnBinned => "Column Binned",
            Self::DatasetSaved => "Dataset Saved",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_kind_of() {
        assert_eq!(ColumnKind::of(&DataType::Int64), ColumnKind::Numeric);
        assert_eq!(ColumnKind::of(&DataType::Float32), ColumnKind::Numeric);
        assert_eq!(ColumnKind::of(&DataType::String), ColumnKind::Categorical);
        assert_eq!(ColumnKind::of(&DataType::Boolean), ColumnKind::Categorical);
    }

    #[test]
    fn test_clip_bounds_from_quartiles() {
        let bounds = ClipBounds::from_quartiles(2.0, 6.0, 1.5);
        assert_eq!(bounds.iqr, 4.0);
        assert_eq!(bounds.lower, -4.0);
        assert_eq!(bounds.upper, 12.0);
        assert!(bounds.contains(12.0));
        assert!(!bounds.contains(12.5));
        assert_eq!(bounds.clip(100.0), 12.0);
        assert_eq!(bounds.clip(-100.0), -4.0);
        assert_eq!(bounds.clip(3.0), 3.0);
    }

    #[test]
    fn test_summary_totals() {
        let mut summary = PreprocessingSummary::new();
        summary.rows_before = 10;
        summary.rows_after = 8;
        summary.imputations.push(ImputationStats {
            column: "a".to_string(),
            fill_value: FillValue::Median(1.0),
            filled: 3,
        });
        summary.clips.push(ColumnClip {
            column: "a".to_string(),
            bounds: ClipBounds::from_quartiles(0.0, 1.0, 1.5),
            clipped: 2,
        });

        assert_eq!(summary.rows_removed(), 2);
        assert!((summary.rows_removed_percentage() - 20.0).abs() < 0.01);
        assert_eq!(summary.values_imputed(), 3);
        assert_eq!(summary.values_clipped(), 2);
    }

    #[test]
    fn test_fill_value_display() {
        assert_eq!(FillValue::Median(2.5).to_string(), "median 2.5");
        assert_eq!(FillValue::Mode("red".to_string()).to_string(), "mode 'red'");
    }

    #[test]
    fn test_binning_outcome_distinct_labels() {
        let outcome = BinningOutcome {
            source_column: "HouseAge".to_string(),
            output_column: "HouseAge_bin".to_string(),
            strategy: BinningStrategy::EqualWidth,
            edges: vec![0.0, 1.0, 2.0, 3.0],
            counts: vec![
                ("young".to_string(), 4),
                ("medium".to_string(), 0),
                ("old".to_string(), 2),
            ],
        };
        assert_eq!(outcome.distinct_labels(), 2);
    }

    #[test]
    fn test_summary_serialization() {
        let mut summary = PreprocessingSummary::new();
        summary.duration_ms = 1500;
        summary.add_action(PreprocessingAction::new(
            ActionType::DuplicatesRemoved,
            "dataset",
            "Removed 5 duplicate rows",
        ));

        let json = serde_json::to_string(&summary).expect("Should serialize");
        assert!(json.contains("1500"));
        assert!(json.contains("duplicates_removed"));
    }

    #[test]
    fn test_action_types_serialize_snake_case() {
        let cases = [
            (ActionType::RowsRemoved, "\"rows_removed\""),
            (ActionType::ValueImputed, "\"value_imputed\""),
            (ActionType::DataNormalized, "\"data_normalized\""),
            (ActionType::ColumnBinned, "\"column_binned\""),
            (ActionType::DatasetSaved, "\"dataset_saved\""),
        ];

        for (action_type, expected) in cases {
            let json = serde_json::to_string(&action_type).expect("Should serialize");
            assert_eq!(json, expected, "ActionType::{action_type:?}");
        }
    }
}
