use std::sync::Arc;

use polars::prelude::{DataFrame, PolarsError};

use crate::frame;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("sink error: {0}")]
    Sink(String),
    #[error("required column '{0}' is missing")]
    MissingColumn(String),
    #[error("invalid {column} '{value}' at row {row}")]
    InvalidTimestamp {
        column: String,
        row: usize,
        value: String,
    },
    #[error("raw table is empty")]
    EmptyTable,
    #[error("dataframe error: {0}")]
    Frame(#[from] PolarsError),
}

/// Supplies the raw table a pipeline run starts from.
#[async_trait::async_trait]
pub trait Source: Send + Sync {
    async fn load(&self) -> Result<DataFrame, PipelineError>;
}

/// A whole-table, in-memory step.
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, input: DataFrame) -> Result<DataFrame, PipelineError>;
}

/// Persists the final table.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    async fn write(&self, table: &DataFrame) -> Result<(), PipelineError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub rows_read: usize,
    pub rows_written: usize,
    pub columns: Vec<String>,
}

pub struct Pipeline<S, K> {
    pub source: S,
    pub transforms: Vec<Arc<dyn Transform>>,
    pub sink: K,
}

impl<S, K> Pipeline<S, K>
where
    S: Source,
    K: Sink,
{
    pub async fn run(self) -> Result<PipelineReport, PipelineError> {
        let mut table = self.source.load().await?;
        let rows_read = table.height();
        tracing::info!(rows = rows_read, columns = table.width(), "raw table loaded");

        // Apply transforms in sequence (if any).
        for t in &self.transforms {
            table = match t.apply(table) {
                Ok(out) => out,
                Err(e) => {
                    metrics::counter!("pipeline_transform_failures_total", "transform" => t.name()).increment(1);
                    tracing::error!(transform = t.name(), error = %e, "transform failed");
                    return Err(e);
                }
            };
            tracing::debug!(transform = t.name(), columns = table.width(), "transform applied");
        }

        self.sink.write(&table).await?;

        let report = PipelineReport {
            rows_read,
            rows_written: table.height(),
            columns: frame::column_names(&table),
        };
        tracing::info!(rows = report.rows_written, columns = ?report.columns, "dataset written");

        Ok(report)
    }
}
