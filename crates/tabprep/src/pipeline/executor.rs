//! Preprocessing executor module.
//!
//! Runs the value-level stages (imputation, standardization, outlier clipping
//! and binning) and records what each one did in the run summary.

use crate::config::{PipelineConfig, ZeroVariancePolicy};
use crate::error::Result as PipelineResult;
use crate::imputers::StatisticalImputer;
use crate::pipeline::binning::Binner;
use crate::pipeline::outliers::OutlierHandler;
use crate::scaling::{ScalerState, StandardScaler};
use crate::types::{ActionType, BinningOutcome, PreprocessingAction, PreprocessingSummary};
use anyhow::Result;
use polars::prelude::*;
use tracing::{debug, info};

/// Executes the value-level stages on a DataFrame.
pub struct PreprocessingExecutor;

impl PreprocessingExecutor {
    /// Fill missing values column by column.
    pub fn impute(&self, df: DataFrame, summary: &mut PreprocessingSummary) -> Result<DataFrame> {
        let report = StatisticalImputer::impute_frame(&df)?;

        for stats in &report.stats {
            summary.add_action(
                PreprocessingAction::new(
                    ActionType::ValueImputed,
                    &stats.column,
                    format!("Filled {} missing values", stats.filled),
                )
                .with_details(stats.fill_value.to_string()),
            );
        }
        for column in &report.skipped {
            summary.add_warning(format!(
                "Column '{}' has no usable fill value and was left unfilled",
                column
            ));
        }

        info!(
            "Imputed {} values across {} columns",
            report.stats.iter().map(|s| s.filled).sum::<usize>(),
            report.stats.len()
        );
        summary.imputations.extend(report.stats);

        Ok(report.data)
    }

    /// Z-score standardize every numeric column.
    ///
    /// Returns the crate error type so a zero-variance rejection reaches the
    /// caller unchanged.
    pub fn standardize(
        &self,
        df: &DataFrame,
        policy: ZeroVariancePolicy,
        summary: &mut PreprocessingSummary,
    ) -> PipelineResult<(DataFrame, ScalerState)> {
        let (df, state) = StandardScaler::fit_transform(df, policy)?;

        if !state.columns.is_empty() {
            let names: Vec<&str> = state.columns.iter().map(|(name, _)| name.as_str()).collect();
            summary.add_action(
                PreprocessingAction::new(
                    ActionType::DataNormalized,
                    "dataset",
                    format!("Standardized {} numeric columns", names.len()),
                )
                .with_details(names.join(", ")),
            );
        }
        for column in &state.unscaled {
            summary.add_warning(format!(
                "Column '{}' has zero variance and was left unscaled",
                column
            ));
        }
        for column in &state.non_finite {
            summary.add_warning(format!(
                "Column '{}' holds infinite values and was left unscaled",
                column
            ));
        }

        info!(
            "Standardized {} columns ({} left unscaled)",
            state.columns.len(),
            state.unscaled.len() + state.non_finite.len()
        );
        Ok((df, state))
    }

    /// Clamp numeric columns to their IQR bounds.
    pub fn clip_outliers(
        &self,
        df: DataFrame,
        iqr_multiplier: f64,
        summary: &mut PreprocessingSummary,
    ) -> Result<DataFrame> {
        let report = OutlierHandler::clip_iqr(df, iqr_multiplier)?;
        let clips = report.clips;

        for clip in clips.iter().filter(|c| c.clipped > 0) {
            summary.add_action(
                PreprocessingAction::new(
                    ActionType::OutlierHandled,
                    &clip.column,
                    format!("Clipped {} values", clip.clipped),
                )
                .with_details(format!(
                    "bounds [{:.4}, {:.4}]",
                    clip.bounds.lower, clip.bounds.upper
                )),
            );
        }

        for column in &report.skipped {
            summary.add_warning(format!(
                "Column '{}' has non-finite outlier fences and was not clipped",
                column
            ));
        }

        let total: usize = clips.iter().map(|c| c.clipped).sum();
        info!("Clipped {} values across {} columns", total, clips.len());
        summary.clips.extend(clips);

        Ok(report.data)
    }

    /// Derive the bucket column for the configured source column.
    pub fn bin(
        &self,
        df: DataFrame,
        config: &PipelineConfig,
        summary: &mut PreprocessingSummary,
    ) -> Result<(DataFrame, Option<BinningOutcome>)> {
        let report = Binner::bin_column(
            df,
            &config.bin_column,
            &config.bin_output_column(),
            &config.bin_labels,
        )?;

        for warning in report.warnings {
            summary.add_warning(warning);
        }

        match &report.outcome {
            Some(outcome) => {
                let counts: Vec<String> = outcome
                    .counts
                    .iter()
                    .map(|(label, n)| format!("{label}={n}"))
                    .collect();
                summary.add_action(
                    PreprocessingAction::new(
                        ActionType::ColumnBinned,
                        &outcome.output_column,
                        format!(
                            "Binned '{}' using {:?} edges",
                            outcome.source_column, outcome.strategy
                        ),
                    )
                    .with_details(counts.join(", ")),
                );
                info!(
                    "Added '{}' ({} distinct labels)",
                    outcome.output_column,
                    outcome.distinct_labels()
                );
            }
            None => debug!("No bucket column derived"),
        }

        Ok((report.data, report.outcome))
    }
}
