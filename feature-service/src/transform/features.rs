//! Per-row feature derivation over a raw readings table.
//!
//! Every derived cell is a pure function of its own source row. Calendar
//! fields use Monday = 0 … Sunday = 6.

use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime, Time,
};

use polars::prelude::*;

use crate::{
    frame::{numeric_column, require_column, text_column},
    pipeline::{PipelineError, Transform},
};

pub const READING_DATE: &str = "reading_date";

/// Columns the transform cannot run without.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    READING_DATE,
    "voltage",
    "power_factor",
    "temperature",
    "units",
    "load_kw",
];

pub const LOW_VOLTAGE: f64 = 180.0;
pub const HIGH_VOLTAGE: f64 = 250.0;
pub const POWER_FACTOR_THRESHOLD: f64 = 0.85;
pub const HIGH_TEMPERATURE: f64 = 40.0;
pub const LOAD_EPSILON: f64 = 1e-5;
pub const WEEKEND_DAYS: [i64; 2] = [5, 6];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoltageStatus {
    Low,
    Normal,
    High,
}

impl VoltageStatus {
    /// Both thresholds are exclusive: 180 and 250 are still normal.
    pub fn classify(voltage: f64) -> Self {
        if voltage < LOW_VOLTAGE {
            VoltageStatus::Low
        } else if voltage > HIGH_VOLTAGE {
            VoltageStatus::High
        } else {
            VoltageStatus::Normal
        }
    }

    pub fn flag(self) -> i64 {
        match self {
            VoltageStatus::Low => 0,
            VoltageStatus::Normal => 1,
            VoltageStatus::High => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoltageStatus::Low => "low",
            VoltageStatus::Normal => "normal",
            VoltageStatus::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    pub hour: i64,
    pub day_of_week: i64,
    pub is_weekend: i64,
}

pub fn calendar_features(ts: PrimitiveDateTime) -> CalendarFeatures {
    let day_of_week = i64::from(ts.weekday().number_days_from_monday());
    CalendarFeatures {
        hour: i64::from(ts.hour()),
        day_of_week,
        is_weekend: is_weekend(day_of_week),
    }
}

pub fn is_weekend(day_of_week: i64) -> i64 {
    i64::from(WEEKEND_DAYS.contains(&day_of_week))
}

pub fn voltage_flag(voltage: f64) -> i64 {
    VoltageStatus::classify(voltage).flag()
}

pub fn pf_issue(power_factor: f64) -> i64 {
    i64::from(power_factor < POWER_FACTOR_THRESHOLD)
}

pub fn high_temp(temperature: f64) -> i64 {
    i64::from(temperature > HIGH_TEMPERATURE)
}

/// Consumption per unit of connected load. `None` when the ratio is not finite.
pub fn load_intensity(units: f64, load_kw: f64) -> Option<f64> {
    let v = units / (load_kw + LOAD_EPSILON);
    v.is_finite().then_some(v)
}

/// Parse a reading timestamp into its local wall-clock time.
///
/// Accepts RFC 3339, Postgres `timestamp[tz]::text` output, ISO-8601 with a
/// `T` separator and no offset, minute precision with either separator, and
/// bare dates.
pub fn parse_reading_date(raw: &str) -> Option<PrimitiveDateTime> {
    let raw = raw.trim();

    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(PrimitiveDateTime::new(ts.date(), ts.time()));
    }
    if let Ok(ts) = OffsetDateTime::parse(
        raw,
        format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory][optional [:[offset_minute]]]"
        ),
    ) {
        return Some(PrimitiveDateTime::new(ts.date(), ts.time()));
    }

    PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            raw,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"),
        )
    })
    .or_else(|_| PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day] [hour]:[minute]")))
    .or_else(|_| PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day]T[hour]:[minute]")))
    .or_else(|_| {
        Date::parse(raw, format_description!("[year]-[month]-[day]"))
            .map(|d| PrimitiveDateTime::new(d, Time::MIDNIGHT))
    })
    .ok()
}

fn parse_dates(dates: &StringChunked) -> Result<Vec<PrimitiveDateTime>, PipelineError> {
    dates
        .iter()
        .enumerate()
        .map(|(row, raw)| {
            raw.and_then(parse_reading_date)
                .ok_or_else(|| PipelineError::InvalidTimestamp {
                    column: READING_DATE.to_string(),
                    row,
                    value: raw.unwrap_or_default().to_string(),
                })
        })
        .collect()
}

/// Augment `df` with the derived feature columns.
///
/// Required columns and every timestamp are validated before any column is
/// added, so on error the frame is left exactly as it was. Missing or
/// non-numeric source cells yield null derived cells.
pub fn add_features(df: &mut DataFrame) -> Result<(), PipelineError> {
    for name in REQUIRED_COLUMNS {
        require_column(df, name)?;
    }

    let dates = parse_dates(&text_column(df, READING_DATE)?)?;
    let voltage = numeric_column(df, "voltage")?;
    let power_factor = numeric_column(df, "power_factor")?;
    let temperature = numeric_column(df, "temperature")?;
    let units = numeric_column(df, "units")?;
    let load_kw = numeric_column(df, "load_kw")?;

    let calendar: Vec<CalendarFeatures> = dates.into_iter().map(calendar_features).collect();
    let status: Vec<Option<VoltageStatus>> = voltage.iter().map(|v| v.map(VoltageStatus::classify)).collect();
    let intensity: Vec<Option<f64>> = units
        .iter()
        .zip(load_kw.iter())
        .map(|(u, l)| u.zip(l).and_then(|(u, l)| load_intensity(u, l)))
        .collect();
    let missing = intensity.iter().filter(|v| v.is_none()).count();

    let derived = [
        Series::new("hour".into(), calendar.iter().map(|c| c.hour).collect::<Vec<_>>()),
        Series::new("day_of_week".into(), calendar.iter().map(|c| c.day_of_week).collect::<Vec<_>>()),
        Series::new("is_weekend".into(), calendar.iter().map(|c| c.is_weekend).collect::<Vec<_>>()),
        Series::new(
            "voltage_status".into(),
            status.iter().map(|s| s.map(VoltageStatus::as_str)).collect::<Vec<_>>(),
        ),
        Series::new(
            "voltage_flag".into(),
            status.iter().map(|s| s.map(VoltageStatus::flag)).collect::<Vec<_>>(),
        ),
        Series::new(
            "pf_issue".into(),
            power_factor.iter().map(|v| v.map(pf_issue)).collect::<Vec<_>>(),
        ),
        Series::new(
            "high_temp".into(),
            temperature.iter().map(|v| v.map(high_temp)).collect::<Vec<_>>(),
        ),
        Series::new("load_intensity".into(), intensity),
    ];
    for series in derived {
        df.with_column(series)?;
    }

    if missing > 0 {
        metrics::counter!("feature_load_intensity_missing_total").increment(missing as u64);
        tracing::warn!(rows = missing, "load_intensity missing for rows with invalid units/load_kw");
    }

    Ok(())
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FeatureTransformer;

impl Transform for FeatureTransformer {
    fn name(&self) -> &'static str {
        "feature_transformer"
    }

    fn apply(&self, mut input: DataFrame) -> Result<DataFrame, PipelineError> {
        match add_features(&mut input) {
            Ok(()) => {
                metrics::counter!("feature_rows_total").increment(input.height() as u64);
                Ok(input)
            }
            Err(e) => {
                metrics::counter!("feature_transform_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}
