//! Column helpers over `polars` frames shared by the pipeline stages.
//!
//! Raw inputs are read with every column as text; numeric views are taken
//! with a non-strict cast so unparseable cells become nulls.

use std::{fs::File, io::BufWriter, path::Path};

use polars::prelude::*;

use crate::pipeline::PipelineError;

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().into_iter().map(|n| n.to_string()).collect()
}

pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series, PipelineError> {
    df.column(name)
        .map(Column::as_materialized_series)
        .map_err(|_| PipelineError::MissingColumn(name.to_string()))
}

/// Numeric view of a column. Non-numeric text and non-finite values are null.
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Float64Chunked, PipelineError> {
    let series = require_column(df, name)?;
    let cast = series.cast(&DataType::Float64)?;
    let ca: Float64Chunked = cast
        .f64()?
        .iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    Ok(ca.with_name(series.name().clone()))
}

/// Text view of a column, whatever its stored type.
pub fn text_column(df: &DataFrame, name: &str) -> Result<StringChunked, PipelineError> {
    let series = require_column(df, name)?;
    Ok(series.cast(&DataType::String)?.str()?.clone())
}

/// Read a headered CSV file with every column as text.
pub fn read_csv(path: &Path) -> PolarsResult<DataFrame> {
    read_csv_rows(path, None)
}

/// Like [`read_csv`] but stops after `n_rows` data rows when given.
pub fn read_csv_rows(path: &Path, n_rows: Option<usize>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_n_rows(n_rows)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// Write `df` as headered CSV, replacing any existing file. Nulls are empty.
pub fn write_csv(df: &DataFrame, path: &Path) -> PolarsResult<()> {
    let file = File::create(path)?;
    let mut out = df.clone();
    CsvWriter::new(BufWriter::new(file))
        .include_header(true)
        .finish(&mut out)
}
