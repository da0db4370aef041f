use anyhow::Result;
use sqlx::PgPool;

use crate::domain::MeterReadingRow;

/// Fetch every meter reading left-joined with its customer record.
///
/// All columns are cast to text; see [`MeterReadingRow`].
pub async fn load_readings_with_customers(pool: &PgPool) -> Result<Vec<MeterReadingRow>> {
    let rows = sqlx::query_as::<_, MeterReadingRow>(
        r#"
        SELECT
            md.id::text              AS id,
            md.meter_id::text        AS meter_id,
            md.reading_date::text    AS reading_date,
            md.units::text           AS units,
            md.voltage::text         AS voltage,
            md.temperature::text     AS temperature,
            md.power_factor::text    AS power_factor,
            md.load_kw::text         AS load_kw,
            md.frequency_hz::text    AS frequency_hz,
            md.phase::text           AS phase,
            md.status::text          AS status,
            c.name::text             AS name,
            c.mobile_number::text    AS mobile_number,
            c.address::text          AS address,
            c.city::text             AS city,
            c.pincode::text          AS pincode,
            c.connection_type::text  AS connection_type,
            c.tariff_plan::text      AS tariff_plan,
            c.connection_date::text  AS connection_date
        FROM meter_data md
        LEFT JOIN customers c
          ON md.meter_id = c.meter_id
        ORDER BY md.reading_date, md.meter_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Row count of the raw readings table, used as a pre-flight quality check.
pub async fn count_readings(pool: &PgPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM meter_data")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
