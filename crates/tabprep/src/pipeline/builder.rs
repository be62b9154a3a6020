//! Main cleaning pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the cleaning workflow.

use crate::cleaner::DataCleaner;
use crate::config::{ConfigValidationError, EmptyTablePolicy, PipelineConfig};
use crate::error::{PreprocessingError, Result};
use crate::output::DatasetWriter;
use crate::pipeline::PreprocessingExecutor;
use crate::pipeline::progress::{
    ClosureProgressReporter, PreprocessingStage, ProgressReporter, ProgressUpdate,
};
use crate::types::{ActionType, PipelineResult, PreprocessingAction, PreprocessingSummary};
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// The main cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use tabprep::{Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .save_dir("out")
///     .timestamp(false)
///     .build()?;
///
/// let result = Pipeline::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(dataframe)?;
///
/// println!("Saved to {:?}", result.saved_path);
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cleaner: DataCleaner,
    executor: PreprocessingExecutor,
    writer: DatasetWriter,
}

// Pipelines can be moved onto a worker thread
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over `df`.
    ///
    /// Returns the cleaned table, the fitted scaler state and the saved path
    /// (when persistence is enabled), together with the binning outcome and a
    /// summary of the run.
    ///
    /// # Errors
    ///
    /// `EmptyTable` and `ZeroVariance` are only raised under the matching
    /// `Fail` policies. File system failures surface as `Io`.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        match self.process_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn start_stage(&self, stage: PreprocessingStage) {
        self.report_progress(ProgressUpdate::started(stage));
    }

    /// Apply the empty-table policy.
    fn check_empty(&self, df: &DataFrame, when: &str) -> Result<()> {
        if df.height() > 0 {
            return Ok(());
        }
        match self.config.empty_table {
            EmptyTablePolicy::Fail => Err(PreprocessingError::EmptyTable(when.to_string())),
            EmptyTablePolicy::Passthrough => {
                info!("Table has no rows {}; stages will be no-ops", when);
                Ok(())
            }
        }
    }

    fn process_internal(&self, df: DataFrame) -> Result<PipelineResult> {
        let start_time = Instant::now();

        info!("Starting cleaning pipeline...");
        self.start_stage(PreprocessingStage::Initializing);

        let mut summary = PreprocessingSummary::new();
        summary.rows_before = df.height();
        summary.columns_before = df.width();

        self.check_empty(&df, "on input")?;

        // Step 1: Drop rows with every value missing
        self.start_stage(PreprocessingStage::RemovingEmptyRows);
        info!("Step 1: Removing fully-empty rows...");
        let (df, removed) = self
            .cleaner
            .drop_empty_rows(df)
            .map_err(|e| PreprocessingError::CleaningFailed(e.to_string()))?;
        summary.empty_rows_removed = removed;
        if removed > 0 {
            summary.add_action(PreprocessingAction::new(
                ActionType::RowsRemoved,
                "dataset",
                format!("Removed {} fully-empty rows", removed),
            ));
        }
        self.check_empty(&df, "after removing fully-empty rows")?;

        // Step 2: Impute missing values
        self.start_stage(PreprocessingStage::Imputation);
        info!("Step 2: Imputing missing values...");
        let df = self.executor.impute(df, &mut summary).map_err(|e| {
            PreprocessingError::ImputationFailed {
                column: "dataset".to_string(),
                reason: e.to_string(),
            }
        })?;

        // Step 3: Drop duplicate rows
        self.start_stage(PreprocessingStage::Deduplication);
        info!("Step 3: Removing duplicate rows...");
        let (df, duplicates) = self
            .cleaner
            .remove_duplicates(df)
            .map_err(|e| PreprocessingError::CleaningFailed(e.to_string()))?;
        summary.duplicates_removed = duplicates;
        if duplicates > 0 {
            summary.add_action(PreprocessingAction::new(
                ActionType::DuplicatesRemoved,
                "dataset",
                format!("Removed {} duplicate rows", duplicates),
            ));
        }

        // Step 4: Standardize numeric columns
        self.start_stage(PreprocessingStage::Standardization);
        info!("Step 4: Standardizing numeric columns...");
        let (df, scaler) = self
            .executor
            .standardize(&df, self.config.zero_variance, &mut summary)
            .map_err(|e| match e {
                PreprocessingError::ZeroVariance(_) => e,
                other => PreprocessingError::StandardizationFailed(other.to_string()),
            })?;

        // Step 5: Clip outliers
        self.start_stage(PreprocessingStage::OutlierClipping);
        info!("Step 5: Clipping outliers (k = {})...", self.config.iqr_multiplier);
        let df = self
            .executor
            .clip_outliers(df, self.config.iqr_multiplier, &mut summary)
            .map_err(|e| PreprocessingError::ClippingFailed(e.to_string()))?;

        // Step 6: Bin the designated column
        self.start_stage(PreprocessingStage::Binning);
        info!("Step 6: Binning '{}'...", self.config.bin_column);
        let (mut df, binning) = self
            .executor
            .bin(df, &self.config, &mut summary)
            .map_err(|e| PreprocessingError::BinningFailed {
                column: self.config.bin_column.clone(),
                reason: e.to_string(),
            })?;

        // Step 7: Persist
        let saved_path = if self.config.save {
            self.start_stage(PreprocessingStage::Saving);
            info!("Step 7: Saving cleaned table...");
            let path = self.writer.write(&mut df)?;
            summary.add_action(PreprocessingAction::new(
                ActionType::DatasetSaved,
                "dataset",
                format!("Saved cleaned table to {}", path.display()),
            ));
            Some(path)
        } else {
            info!("Step 7: Skipping save (disabled)");
            None
        };

        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        summary.rows_after = df.height();
        summary.columns_after = df.width();

        info!(
            "Cleaning complete: {} -> {} rows, {} -> {} columns in {} ms",
            summary.rows_before,
            summary.rows_after,
            summary.columns_before,
            summary.columns_after,
            summary.duration_ms
        );

        Ok(PipelineResult {
            data: df,
            scaler,
            saved_path,
            binning,
            summary,
        })
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use tabprep::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct MyReporter;
    ///
    /// impl ProgressReporter for MyReporter {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         println!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(MyReporter))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// Convenience for [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let writer = DatasetWriter::from_config(&config);

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            cleaner: DataCleaner,
            executor: PreprocessingExecutor,
            writer,
        })
    }
}
