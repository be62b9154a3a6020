//! Configuration types for the cleaning pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! Every knob the pipeline reads lives on [`PipelineConfig`]. The `DEFAULT_*`
//! constants only seed its defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default directory the cleaned table is written to.
pub const DEFAULT_SAVE_DIR: &str = "preprocessing/california_preprocessing";

/// Default base name of the written file.
pub const DEFAULT_DATASET_NAME: &str = "california-housing_preprocessing";

/// Default column that receives a derived bucket column.
pub const DEFAULT_BIN_COLUMN: &str = "HouseAge";

/// Default ordered bucket labels.
pub const DEFAULT_BIN_LABELS: [&str; 3] = ["young", "medium", "old"];

/// Default IQR multiplier used for outlier clipping.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// What to do when a numeric column has zero standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ZeroVariancePolicy {
    /// Leave the column unscaled and record it in the scaler state
    #[default]
    PassThrough,
    /// Abort the run with `PreprocessingError::ZeroVariance`
    Fail,
}

/// What to do when the table has no rows (on input or after empty-row removal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EmptyTablePolicy {
    /// Run every stage as a no-op and return the empty table
    #[default]
    Passthrough,
    /// Abort the run with `PreprocessingError::EmptyTable`
    Fail,
}

/// Configuration for the cleaning pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use tabprep::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .save_dir("out")
///     .dataset_name("housing")
///     .timestamp(false)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Whether to write the cleaned table to disk.
    /// Default: true
    pub save: bool,

    /// Directory the cleaned table is written to. Created if absent.
    /// Default: "preprocessing/california_preprocessing"
    pub save_dir: PathBuf,

    /// Base file name (without extension).
    /// Default: "california-housing_preprocessing"
    pub dataset_name: String,

    /// Whether to append a `_YYYYMMDD_HHMMSS` capture timestamp to the file name.
    /// Default: true
    pub timestamp: bool,

    /// Column that receives a derived `{name}_bin` bucket column when present.
    /// Default: "HouseAge"
    pub bin_column: String,

    /// Ordered bucket labels, lowest bucket first.
    /// Default: ["young", "medium", "old"]
    pub bin_labels: Vec<String>,

    /// Multiplier applied to the IQR when computing clip bounds.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Handling of zero-variance numeric columns during standardization.
    /// Default: PassThrough
    pub zero_variance: ZeroVariancePolicy,

    /// Handling of tables without rows.
    /// Default: Passthrough
    pub empty_table: EmptyTablePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            save: true,
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            dataset_name: DEFAULT_DATASET_NAME.to_string(),
            timestamp: true,
            bin_column: DEFAULT_BIN_COLUMN.to_string(),
            bin_labels: default_bin_labels(),
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            zero_variance: ZeroVariancePolicy::default(),
            empty_table: EmptyTablePolicy::default(),
        }
    }
}

fn default_bin_labels() -> Vec<String> {
    DEFAULT_BIN_LABELS.iter().map(|s| s.to_string()).collect()
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Parse a configuration from JSON and validate it.
    ///
    /// Missing fields take their defaults.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Name of the derived bucket column, e.g. `HouseAge_bin`.
    pub fn bin_output_column(&self) -> String {
        format!("{}_bin", self.bin_column)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.dataset_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyDatasetName);
        }

        if self.dataset_name.contains(['/', '\\']) {
            return Err(ConfigValidationError::InvalidDatasetName(
                self.dataset_name.clone(),
            ));
        }

        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(ConfigValidationError::InvalidIqrMultiplier(
                self.iqr_multiplier,
            ));
        }

        if self.bin_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBinColumn);
        }

        if self.bin_labels.len() < 2 {
            return Err(ConfigValidationError::TooFewBinLabels(self.bin_labels.len()));
        }

        for (i, label) in self.bin_labels.iter().enumerate() {
            if self.bin_labels[..i].contains(label) {
                return Err(ConfigValidationError::DuplicateBinLabel(label.clone()));
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Dataset name must not be empty")]
    EmptyDatasetName,

    #[error("Invalid dataset name '{0}' (must not contain path separators)")]
    InvalidDatasetName(String),

    #[error("Invalid IQR multiplier: {0} (must be a finite, non-negative number)")]
    InvalidIqrMultiplier(f64),

    #[error("Bin column name must not be empty")]
    EmptyBinColumn,

    #[error("Too few bin labels: {0} (need at least 2)")]
    TooFewBinLabels(usize),

    #[error("Duplicate bin label '{0}'")]
    DuplicateBinLabel(String),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    save: Option<bool>,
    save_dir: Option<PathBuf>,
    dataset_name: Option<String>,
    timestamp: Option<bool>,
    bin_column: Option<String>,
    bin_labels: Option<Vec<String>>,
    iqr_multiplier: Option<f64>,
    zero_variance: Option<ZeroVariancePolicy>,
    empty_table: Option<EmptyTablePolicy>,
}

impl PipelineConfigBuilder {
    /// Enable or disable writing the cleaned table to disk.
    ///
    /// When false, the pipeline returns no path and performs no file I/O.
    pub fn save(mut self, save: bool) -> Self {
        self.save = Some(save);
        self
    }

    /// Set the directory the cleaned table is written to.
    pub fn save_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(path.into());
        self
    }

    /// Set the base file name (without extension).
    pub fn dataset_name(mut self, name: impl Into<String>) -> Self {
        self.dataset_name = Some(name.into());
        self
    }

    /// Enable or disable the capture timestamp in the file name.
    pub fn timestamp(mut self, timestamp: bool) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the column that receives the derived bucket column.
    pub fn bin_column(mut self, column: impl Into<String>) -> Self {
        self.bin_column = Some(column.into());
        self
    }

    /// Set the ordered bucket labels, lowest bucket first.
    pub fn bin_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bin_labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Set the IQR multiplier used for outlier clipping.
    ///
    /// # Arguments
    /// * `k` - Non-negative multiplier (e.g., 1.5 gives `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]`)
    pub fn iqr_multiplier(mut self, k: f64) -> Self {
        self.iqr_multiplier = Some(k);
        self
    }

    /// Set the zero-variance policy for standardization.
    pub fn zero_variance(mut self, policy: ZeroVariancePolicy) -> Self {
        self.zero_variance = Some(policy);
        self
    }

    /// Set the empty-table policy.
    pub fn empty_table(mut self, policy: EmptyTablePolicy) -> Self {
        self.empty_table = Some(policy);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            save: self.save.unwrap_or(true),
            save_dir: self
                .save_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_DIR)),
            dataset_name: self
                .dataset_name
                .unwrap_or_else(|| DEFAULT_DATASET_NAME.to_string()),
            timestamp: self.timestamp.unwrap_or(true),
            bin_column: self
                .bin_column
                .unwrap_or_else(|| DEFAULT_BIN_COLUMN.to_string()),
            bin_labels: self.bin_labels.unwrap_or_else(default_bin_labels),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(DEFAULT_IQR_MULTIPLIER),
            zero_variance: self.zero_variance.unwrap_or_default(),
            empty_table: self.empty_table.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
