//! Persistence of the cleaned table.
//!
//! The cleaned table is written as comma-separated UTF-8 with a header row
//! and no index column, to `{save_dir}/{dataset_name}[_{YYYYMMDD_HHMMSS}].csv`.

mod writer;

pub use writer::{DatasetWriter, TIMESTAMP_FORMAT};
