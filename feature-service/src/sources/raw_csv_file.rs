use std::path::PathBuf;

use polars::prelude::DataFrame;

use crate::{
    frame,
    pipeline::{PipelineError, Source},
};

/// Raw readings exported as a headered CSV file.
///
/// Column names are taken from the header; every column is read as text and
/// typed later by the stage that consumes it.
pub struct RawCsvFileSource {
    path: PathBuf,
}

impl RawCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Source for RawCsvFileSource {
    async fn load(&self) -> Result<DataFrame, PipelineError> {
        if !self.path.is_file() {
            return Err(PipelineError::Source(format!(
                "CSV file not found: {}",
                self.path.display()
            )));
        }

        // Blocking read; the batch binaries have nothing else to run meanwhile.
        let df = match frame::read_csv(&self.path) {
            Ok(df) => df,
            Err(e) => {
                metrics::counter!("raw_csv_parse_errors_total").increment(1);
                return Err(PipelineError::Source(format!(
                    "failed to read CSV {}: {e}",
                    self.path.display()
                )));
            }
        };

        metrics::counter!("raw_rows_read_total").increment(df.height() as u64);
        Ok(df)
    }
}
