pub mod evaluation;
pub mod linear;

pub use evaluation::RegressionMetrics;
pub use linear::LinearModel;

use std::io;

use ndarray::ArrayView1;

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("model io error: {0}")]
    Io(#[from] io::Error),
    #[error("model artifact is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("model expects features {expected:?}, got {actual:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),
    #[error("cannot fit on {0} rows")]
    NotEnoughRows(usize),
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("normal equations are singular")]
    SingularMatrix,
}

/// An opaque fitted regressor mapping a feature vector to predicted consumption.
pub trait Regressor: Send + Sync {
    fn feature_names(&self) -> &[String];

    /// `features` holds one value per entry of [`Regressor::feature_names`].
    fn predict(&self, features: ArrayView1<'_, f64>) -> f64;
}
