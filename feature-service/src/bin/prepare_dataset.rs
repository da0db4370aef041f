use anyhow::{Context, Result};
use feature_service::{
    config::{AppConfig, SourceKind},
    observability,
    pipeline::Pipeline,
    sinks::CsvDatasetSink,
    sources::{PgReadingSource, RawCsvFileSource},
    transform::{self, ColumnPruner},
    PipelineReport,
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let dataset = AppConfig::section(&cfg.dataset, "dataset")?;

    let sink = CsvDatasetSink::new(&dataset.output_path);
    let transforms = transform::standard_chain(ColumnPruner::with_extra(dataset.extra_drop_columns.clone()));

    let report: PipelineReport = match dataset.source {
        SourceKind::Csv => {
            let path = dataset
                .raw_csv_path
                .as_ref()
                .context("dataset.raw_csv_path is required when dataset.source = \"csv\"")?;
            Pipeline {
                source: RawCsvFileSource::new(path),
                transforms,
                sink,
            }
            .run()
            .await?
        }
        SourceKind::Postgres => {
            let db = AppConfig::section(&cfg.database, "database")?;
            let pool = PgPoolOptions::new()
                .max_connections(db.max_connections)
                .connect(&db.uri)
                .await?;
            Pipeline {
                source: PgReadingSource::new(pool),
                transforms,
                sink,
            }
            .run()
            .await?
        }
    };

    tracing::info!(
        rows_read = report.rows_read,
        rows_written = report.rows_written,
        output = %dataset.output_path.display(),
        "dataset preparation complete"
    );

    Ok(())
}
