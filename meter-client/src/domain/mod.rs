pub mod meter_features;
pub mod meter_reading;

pub use meter_features::MeterFeatures;
pub use meter_reading::MeterReadingRow;
