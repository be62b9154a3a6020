//! Pipeline module.
//!
//! This module provides the cleaning pipeline and its stage components.

pub mod binning;
mod builder;
mod executor;
pub mod outliers;
pub mod progress;

pub use binning::{Binner, BinningReport};
pub use builder::{Pipeline, PipelineBuilder};
pub use executor::PreprocessingExecutor;
pub use outliers::{ClippingReport, OutlierHandler};
pub use progress::{ClosureProgressReporter, PreprocessingStage, ProgressReporter, ProgressUpdate};
