use meter_client::{
    db::{count_readings, load_readings_with_customers},
    domain::MeterReadingRow,
};
use polars::prelude::*;
use sqlx::postgres::PgPool;

use crate::pipeline::{PipelineError, Source};

/// Meter readings joined with customer metadata, read from Postgres.
pub struct PgReadingSource {
    pool: PgPool,
}

impl PgReadingSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Lay out joined rows as a frame of text columns, one per selected column.
pub fn frame_from_rows(rows: &[MeterReadingRow]) -> Result<DataFrame, PipelineError> {
    let mut cells: Vec<Vec<Option<&str>>> = vec![Vec::with_capacity(rows.len()); MeterReadingRow::COLUMNS.len()];
    for row in rows {
        for (idx, cell) in row.cells().into_iter().enumerate() {
            cells[idx].push(cell);
        }
    }

    let columns: Vec<Column> = MeterReadingRow::COLUMNS
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Series::new(name.into(), values).into_column())
        .collect();
    Ok(DataFrame::new(columns)?)
}

#[async_trait::async_trait]
impl Source for PgReadingSource {
    async fn load(&self) -> Result<DataFrame, PipelineError> {
        let count = count_readings(&self.pool)
            .await
            .map_err(|e| PipelineError::Source(format!("meter_data count failed: {e}")))?;
        tracing::info!(rows = count, "meter_data row count");

        let rows = load_readings_with_customers(&self.pool).await.map_err(|e| {
            metrics::counter!("raw_source_errors_total").increment(1);
            PipelineError::Source(format!("failed to load readings: {e}"))
        })?;

        metrics::counter!("raw_rows_read_total").increment(rows.len() as u64);
        frame_from_rows(&rows)
    }
}
