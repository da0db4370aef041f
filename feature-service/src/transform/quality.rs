use polars::prelude::DataFrame;

use crate::pipeline::{PipelineError, Transform};

/// Rejects an empty raw table before any feature work is done.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequireRows;

impl Transform for RequireRows {
    fn name(&self) -> &'static str {
        "require_rows"
    }

    fn apply(&self, input: DataFrame) -> Result<DataFrame, PipelineError> {
        if input.height() == 0 {
            return Err(PipelineError::EmptyTable);
        }
        tracing::info!(rows = input.height(), "raw table passed quality check");
        Ok(input)
    }
}
