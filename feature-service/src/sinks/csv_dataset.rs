use std::{fs, path::PathBuf};

use polars::prelude::DataFrame;

use crate::{
    frame,
    pipeline::{PipelineError, Sink},
};

/// Writes the prepared feature dataset as CSV, replacing any previous file.
pub struct CsvDatasetSink {
    path: PathBuf,
}

impl CsvDatasetSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Sink for CsvDatasetSink {
    async fn write(&self, table: &DataFrame) -> Result<(), PipelineError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| PipelineError::Sink(format!("failed to create {}: {e}", parent.display())))?;
        }

        if let Err(e) = frame::write_csv(table, &self.path) {
            tracing::error!(error = %e, path = %self.path.display(), "dataset write failed");
            metrics::counter!("dataset_sink_errors_total").increment(1);
            return Err(PipelineError::Sink(e.to_string()));
        }

        metrics::counter!("dataset_rows_written_total").increment(table.height() as u64);
        tracing::info!(path = %self.path.display(), rows = table.height(), "dataset saved");
        Ok(())
    }
}
