use anyhow::{bail, Result};
use feature_service::{config::AppConfig, frame, observability, raw_load};
use meter_client::db;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let raw = AppConfig::section(&cfg.raw_load, "raw_load")?;
    let db_cfg = AppConfig::section(&cfg.database, "database")?;

    raw_load::check_csv_readable(&raw.csv_path)?;
    let df = frame::read_csv(&raw.csv_path)?;
    let (columns, rows) = raw_load::rows_for_insert(&df)?;

    let pool = PgPoolOptions::new()
        .max_connections(db_cfg.max_connections)
        .connect(&db_cfg.uri)
        .await?;

    db::create_raw_table(&pool, &raw.table, &columns).await?;
    let inserted = db::insert_raw_rows(&pool, &raw.table, &columns, &rows).await?;
    tracing::info!(rows = inserted, table = %raw.table, "raw rows loaded");

    let count = db::count_rows(&pool, &raw.table).await?;
    if count == 0 {
        bail!("raw table {} is empty after load", raw.table);
    }
    tracing::info!(rows = count, table = %raw.table, "raw table quality check passed");

    Ok(())
}
