use crate::config::PipelineConfig;
use crate::error::{PreprocessingError, Result, ResultExt};
use chrono::{Local, NaiveDateTime};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Local capture-time format appended to the file name.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Writes cleaned tables to disk.
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    save_dir: PathBuf,
    dataset_name: String,
    timestamp: bool,
}

impl DatasetWriter {
    pub fn new(save_dir: impl Into<PathBuf>, dataset_name: impl Into<String>, timestamp: bool) -> Self {
        Self {
            save_dir: save_dir.into(),
            dataset_name: dataset_name.into(),
            timestamp,
        }
    }

    /// Writer using the persistence settings of `config`.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.save_dir.clone(),
            config.dataset_name.clone(),
            config.timestamp,
        )
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// File name for a table captured at `captured_at`.
    pub fn file_name_at(&self, captured_at: &NaiveDateTime) -> String {
        if self.timestamp {
            format!(
                "{}_{}.csv",
                self.dataset_name,
                captured_at.format(TIMESTAMP_FORMAT)
            )
        } else {
            format!("{}.csv", self.dataset_name)
        }
    }

    /// Write `df` and return the path of the new file.
    ///
    /// The save directory is created if needed. An existing file with the
    /// same name is overwritten.
    pub fn write(&self, df: &mut DataFrame) -> Result<PathBuf> {
        fs::create_dir_all(&self.save_dir)
            .context(format!("Creating directory {}", self.save_dir.display()))?;

        let file_name = self.file_name_at(&Local::now().naive_local());
        let path = self.save_dir.join(file_name);
        debug!("Writing {} rows to {}", df.height(), path.display());

        let file = File::create(&path).context(format!("Creating {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        CsvWriter::new(&mut writer)
            .include_header(true)
            .with_separator(b',')
            .finish(df)
            .map_err(|e| match e {
                PolarsError::IO { error, .. } => PreprocessingError::Io(std::io::Error::new(
                    error.kind(),
                    error.to_string(),
                ))
                .with_context(format!("Writing {}", path.display())),
                other => PreprocessingError::SaveFailed(format!("{}: {}", path.display(), other)),
            })?;

        writer
            .flush()
            .context(format!("Flushing {}", path.display()))?;

        info!("Dataset saved: {}", path.display());
        Ok(path)
    }
}
