//! Landing a raw readings CSV in Postgres before feature preparation.

use std::path::Path;

use polars::prelude::DataFrame;

use crate::{
    frame::{self, column_names, text_column},
    pipeline::PipelineError,
};

/// Rows read to confirm the file parses as CSV.
const PREFLIGHT_ROWS: usize = 5;

/// Fails unless `path` is a regular file whose first rows parse as CSV.
pub fn check_csv_readable(path: &Path) -> Result<(), PipelineError> {
    if !path.is_file() {
        return Err(PipelineError::Source(format!("CSV file not found: {}", path.display())));
    }
    frame::read_csv_rows(path, Some(PREFLIGHT_ROWS)).map_err(|e| {
        PipelineError::Source(format!("CSV file is not readable: {}: {e}", path.display()))
    })?;
    tracing::info!(path = %path.display(), "CSV exists and is readable");
    Ok(())
}

/// Header and text cells of `df`, row by row, ready for a text-typed table.
/// Empty cells stay empty. A frame with no rows is rejected.
pub fn rows_for_insert(df: &DataFrame) -> Result<(Vec<String>, Vec<Vec<Option<String>>>), PipelineError> {
    if df.height() == 0 {
        return Err(PipelineError::EmptyTable);
    }

    let columns = column_names(df);
    let cells = columns
        .iter()
        .map(|name| text_column(df, name))
        .collect::<Result<Vec<_>, _>>()?;

    let rows = (0..df.height())
        .map(|i| cells.iter().map(|c| c.get(i).map(str::to_string)).collect())
        .collect();
    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use std::io::Write;

    #[test]
    fn rows_keep_header_order_and_empty_cells() {
        let df = df!(
            "id" => ["1", "2"],
            "voltage" => [Some("220.5"), None],
            "units" => [Some(5i64), Some(7)]
        )
        .unwrap();

        let (columns, rows) = rows_for_insert(&df).unwrap();
        assert_eq!(columns, vec!["id", "voltage", "units"]);
        assert_eq!(
            rows,
            vec![
                vec![Some("1".to_string()), Some("220.5".to_string()), Some("5".to_string())],
                vec![Some("2".to_string()), None, Some("7".to_string())],
            ]
        );
    }

    #[test]
    fn empty_csv_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,meter_id,units").unwrap();

        check_csv_readable(file.path()).unwrap();
        let df = frame::read_csv(file.path()).unwrap();
        assert!(matches!(rows_for_insert(&df), Err(PipelineError::EmptyTable)));
    }

    #[test]
    fn missing_file_fails_the_preflight() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_csv_readable(&dir.path().join("absent.csv")).unwrap_err();
        assert!(err.to_string().contains("not found"));

        let err = check_csv_readable(dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Source(_)));
    }

    #[test]
    fn csv_file_becomes_text_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,meter_id,reading_date,units").unwrap();
        writeln!(file, "1,M-1,2024-01-06 23:00:00,5.5").unwrap();
        writeln!(file, "2,M-2,2024-01-07 00:00:00,").unwrap();

        check_csv_readable(file.path()).unwrap();
        let df = frame::read_csv(file.path()).unwrap();
        let (columns, rows) = rows_for_insert(&df).unwrap();

        assert_eq!(columns.len(), 4);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][2].as_deref(), Some("2024-01-06 23:00:00"));
        assert_eq!(rows[0][3].as_deref(), Some("5.5"));
        assert_eq!(rows[1][3], None);
    }
}
