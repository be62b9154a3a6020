//! Progress reporting for the cleaning pipeline.
//!
//! The pipeline emits one [`ProgressUpdate`] when each stage starts, plus a
//! terminal `Complete` or `Failed` update from [`Pipeline::process`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tabprep::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//! ```
//!
//! [`Pipeline::process`]: crate::pipeline::Pipeline::process

use serde::{Deserialize, Serialize};

/// Stages of the cleaning pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessingStage {
    /// Pipeline is checking its input
    Initializing,
    /// Dropping rows where every value is missing
    RemovingEmptyRows,
    /// Imputing missing values
    Imputation,
    /// Dropping duplicate rows
    Deduplication,
    /// Z-score standardization of numeric columns
    Standardization,
    /// IQR clipping of numeric columns
    OutlierClipping,
    /// Deriving the bucket column
    Binning,
    /// Writing the cleaned table to disk
    Saving,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PreprocessingStage {
    /// The processing stages, excluding terminal states.
    pub const PROCESSING: [PreprocessingStage; 8] = [
        Self::Initializing,
        Self::RemovingEmptyRows,
        Self::Imputation,
        Self::Deduplication,
        Self::Standardization,
        Self::OutlierClipping,
        Self::Binning,
        Self::Saving,
    ];

    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::RemovingEmptyRows => "Removing Empty Rows",
            Self::Imputation => "Imputing Values",
            Self::Deduplication => "Removing Duplicates",
            Self::Standardization => "Standardizing",
            Self::OutlierClipping => "Clipping Outliers",
            Self::Binning => "Binning",
            Self::Saving => "Saving",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Returns the typical weight of this stage in the overall pipeline (0.0 - 1.0).
    ///
    /// Weights of the processing stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.02,
            Self::RemovingEmptyRows => 0.08,
            Self::Imputation => 0.20,
            Self::Deduplication => 0.15,
            Self::Standardization => 0.15,
            Self::OutlierClipping => 0.15,
            Self::Binning => 0.10,
            Self::Saving => 0.15,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match *self {
            Self::Complete => 1.0,
            Self::Failed => 0.0,
            stage => Self::PROCESSING
                .iter()
                .take_while(|s| **s != stage)
                .map(|s| s.weight())
                .sum(),
        }
    }

    /// Overall progress for a fraction of this stage completed.
    pub fn overall_progress(&self, stage_progress: f32) -> f32 {
        (self.base_progress() + self.weight() * stage_progress.clamp(0.0, 1.0)).clamp(0.0, 1.0)
    }
}

/// A single progress update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PreprocessingStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates an update for a stage at the given fraction of completion.
    pub fn new(stage: PreprocessingStage, stage_progress: f32, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: stage.overall_progress(stage_progress),
            message: message.into(),
        }
    }

    /// Creates an update marking the start of a stage.
    pub fn started(stage: PreprocessingStage) -> Self {
        Self::new(stage, 0.0, format!("{}...", stage.display_name()))
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PreprocessingStage::Complete,
            progress: 1.0,
            message: message.into(),
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PreprocessingStage::Failed,
            progress: 0.0,
            message: message.into(),
        }
    }
}

/// Trait for receiving progress updates during cleaning.
///
/// Implementations must be `Send + Sync` so a pipeline can be moved to a
/// worker thread together with its reporter.
pub trait ProgressReporter: Send + Sync {
    /// Called when a stage starts and when the run ends.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
