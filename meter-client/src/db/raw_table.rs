use anyhow::{bail, Result};
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Default landing table for raw reading CSV files.
pub const RAW_TABLE: &str = "meter_data_raw";

/// Postgres accepts at most this many bind parameters per statement.
const MAX_BIND_PARAMS: usize = 65_535;

/// Accepts plain identifiers only (`[A-Za-z_][A-Za-z0-9_]*`) and returns
/// them double-quoted.
pub fn quote_identifier(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        bail!("invalid SQL identifier '{name}'");
    }
    Ok(format!("\"{name}\""))
}

fn quoted_list(columns: &[String]) -> Result<String> {
    let quoted = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Result<Vec<_>>>()?;
    Ok(quoted.join(", "))
}

/// `CREATE TABLE IF NOT EXISTS` with every column typed `TEXT`.
pub fn create_raw_table_sql(table: &str, columns: &[String]) -> Result<String> {
    if columns.is_empty() {
        bail!("raw table '{table}' needs at least one column");
    }
    let defs = columns
        .iter()
        .map(|c| Ok(format!("{} TEXT", quote_identifier(c)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_identifier(table)?,
        defs.join(", ")
    ))
}

pub async fn create_raw_table(pool: &PgPool, table: &str, columns: &[String]) -> Result<()> {
    let sql = create_raw_table_sql(table, columns)?;
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

/// Rows per `INSERT` so one statement stays under the bind parameter limit.
pub fn insert_batch_rows(column_count: usize) -> usize {
    (MAX_BIND_PARAMS / column_count.max(1)).max(1)
}

/// Insert text rows into `table` in one transaction. Returns rows inserted.
pub async fn insert_raw_rows(
    pool: &PgPool,
    table: &str,
    columns: &[String],
    rows: &[Vec<Option<String>>],
) -> Result<u64> {
    if let Some(bad) = rows.iter().position(|r| r.len() != columns.len()) {
        bail!(
            "row {bad} has {} cells, expected {}",
            rows[bad].len(),
            columns.len()
        );
    }

    let prefix = format!(
        "INSERT INTO {} ({}) ",
        quote_identifier(table)?,
        quoted_list(columns)?
    );

    let mut tx = pool.begin().await?;
    let mut inserted = 0;
    for chunk in rows.chunks(insert_batch_rows(columns.len())) {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(&prefix);
        qb.push_values(chunk, |mut b, row| {
            for cell in row {
                b.push_bind(cell.clone());
            }
        });
        inserted += qb.build().execute(&mut *tx).await?.rows_affected();
    }
    tx.commit().await?;

    Ok(inserted)
}

pub async fn count_rows(pool: &PgPool, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table)?);
    let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(pool).await?;
    Ok(count)
}
