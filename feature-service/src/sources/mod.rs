pub mod postgres;
pub mod raw_csv_file;

pub use postgres::PgReadingSource;
pub use raw_csv_file::RawCsvFileSource;
