//! Tabular Cleaning Pipeline Library
//!
//! A linear batch-preprocessing pass over a tabular dataset, built on Polars.
//!
//! # Overview
//!
//! [`Pipeline::process`] runs these stages in order, each consuming the
//! table produced by the previous one:
//!
//! 1. **Empty-row removal**: rows where every value is missing are dropped
//! 2. **Imputation**: median for numeric columns, mode for categorical ones
//! 3. **Deduplication**: exact duplicate rows dropped, first occurrence kept
//! 4. **Standardization**: numeric columns rescaled to zero mean, unit variance
//! 5. **Outlier clipping**: numeric values clamped to `[Q1 - k*IQR, Q3 + k*IQR]`
//! 6. **Binning**: one designated column bucketed into labelled quantile bins
//! 7. **Persistence** (optional): the table is written as a timestamped CSV
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tabprep::{Pipeline, PipelineConfig};
//! use polars::prelude::*;
//!
//! let df = CsvReadOptions::default()
//!     .try_into_reader_with_file_path(Some("housing.csv".into()))?
//!     .finish()?;
//!
//! let config = PipelineConfig::builder()
//!     .save_dir("out")
//!     .dataset_name("housing")
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//!
//! println!("Saved to {:?}", result.saved_path);
//!
//! // Apply the same scaling to new data
//! let scaled = result.scaler.transform(&new_df)?;
//! ```
//!
//! # Configuration
//!
//! Use [`PipelineConfig`] to customize behavior:
//!
//! ```rust,ignore
//! use tabprep::config::*;
//!
//! let config = PipelineConfig::builder()
//!     .save(false)                                  // Keep the result in memory only
//!     .bin_column("Age")                            // Bucket "Age" into "Age_bin"
//!     .bin_labels(["low", "mid", "high"])
//!     .iqr_multiplier(3.0)
//!     .zero_variance(ZeroVariancePolicy::Fail)      // Reject constant numeric columns
//!     .empty_table(EmptyTablePolicy::Fail)          // Reject tables without rows
//!     .build()?;
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod output;
pub mod pipeline;
pub mod scaling;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::DataCleaner;
pub use config::{
    ConfigValidationError, EmptyTablePolicy, PipelineConfig, PipelineConfigBuilder,
    ZeroVariancePolicy,
};
pub use error::{PreprocessingError, Result as PreprocessingResult, ResultExt};
pub use imputers::{ImputationReport, StatisticalImputer};
pub use output::DatasetWriter;
pub use pipeline::{
    Binner, ClippingReport, ClosureProgressReporter, OutlierHandler, Pipeline, PipelineBuilder,
    PreprocessingExecutor, PreprocessingStage, ProgressReporter, ProgressUpdate,
};
pub use scaling::{ColumnScaling, ScalerState, StandardScaler};
pub use types::{
    ActionType, BinningOutcome, BinningStrategy, ClipBounds, ColumnClip, ColumnKind, FillValue,
    ImputationStats, PipelineResult, PreprocessingAction, PreprocessingSummary,
};
