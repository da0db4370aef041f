pub mod api;
pub mod config;
pub mod frame;
pub mod inference;
pub mod metrics_server;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod predictor;
pub mod raw_load;
pub mod sinks;
pub mod sources;
pub mod training;
pub mod transform;

pub use pipeline::{Pipeline, PipelineReport};
pub use predictor::{PredictError, Prediction, Predictor};
