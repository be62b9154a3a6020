//! Custom error types for the cleaning pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Every stage
//! failure is mapped into [`PreprocessingError`] before it reaches the caller,
//! so I/O failures during persistence stay distinguishable from data errors.
//!
//! Errors are serializable as `{ code, message }` so they can be printed as
//! JSON by the command-line front end.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// The input table has no rows (only raised under `EmptyTablePolicy::Fail`).
    #[error("Input table is empty: {0}")]
    EmptyTable(String),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    /// A numeric column has zero standard deviation (only raised under
    /// `ZeroVariancePolicy::Fail`).
    #[error("Column '{0}' has zero standard deviation and cannot be standardized")]
    ZeroVariance(String),

    /// Empty-row removal or deduplication failed.
    #[error("Failed to clean data: {0}")]
    CleaningFailed(String),

    /// Imputation failed.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    ImputationFailed { column: String, reason: String },

    /// Standardization failed.
    #[error("Failed to standardize numeric columns: {0}")]
    StandardizationFailed(String),

    /// Outlier clipping failed.
    #[error("Failed to clip outliers: {0}")]
    ClippingFailed(String),

    /// Binning of the designated column failed.
    #[error("Failed to bin column '{column}': {reason}")]
    BinningFailed { column: String, reason: String },

    /// Writing the cleaned table failed.
    #[error("Failed to save cleaned table: {0}")]
    SaveFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PreprocessingError>,
    },
}

impl PreprocessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PreprocessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code, e.g. for JSON output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyTable(_) => "EMPTY_TABLE",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ZeroVariance(_) => "ZERO_VARIANCE",
            Self::CleaningFailed(_) => "CLEANING_FAILED",
            Self::ImputationFailed { .. } => "IMPUTATION_FAILED",
            Self::StandardizationFailed(_) => "STANDARDIZATION_FAILED",
            Self::ClippingFailed(_) => "CLIPPING_FAILED",
            Self::BinningFailed { .. } => "BINNING_FAILED",
            Self::SaveFailed(_) => "SAVE_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error came from the file system (directory creation or write).
    pub fn is_io(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::WithContext { source, .. } => source.is_io(),
            _ => false,
        }
    }

    /// Check if this error is caused by the input data rather than the environment.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::EmptyTable(_)
            | Self::ColumnNotFound(_)
            | Self::InvalidConfig(_)
            | Self::ZeroVariance(_) => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Io(e).with_context(context))
    }
}
