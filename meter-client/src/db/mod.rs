pub mod raw_table;
pub mod reading_queries;

pub use raw_table::{count_rows, create_raw_table, insert_raw_rows, RAW_TABLE};
pub use reading_queries::{count_readings, load_readings_with_customers};
