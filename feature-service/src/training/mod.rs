//! Fitting the consumption model on a prepared feature dataset.

use meter_client::domain::MeterFeatures;
use ndarray::{Array1, Array2, Axis};
use polars::prelude::{ChunkAgg, DataFrame, Float64Chunked};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    frame::numeric_column,
    model::{LinearModel, ModelError, RegressionMetrics},
    pipeline::PipelineError,
};

/// Prediction target column.
pub const TARGET: &str = "units";

#[derive(thiserror::Error, Debug)]
pub enum TrainingError {
    #[error(transparent)]
    Data(#[from] PipelineError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitOptions {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Missing cells replaced by the column mean. A column with no valid cell at
/// all is filled with zeros.
pub fn impute_mean(column: &Float64Chunked) -> Array1<f64> {
    let mean = column.mean().unwrap_or(0.0);
    column.iter().map(|v| v.unwrap_or(mean)).collect()
}

/// Mean-imputed feature matrix, one column per entry of `feature_names`.
pub fn feature_matrix<S: AsRef<str>>(
    df: &DataFrame,
    feature_names: &[S],
) -> Result<Array2<f64>, PipelineError> {
    let mut x = Array2::zeros((df.height(), feature_names.len()));
    for (j, name) in feature_names.iter().enumerate() {
        let column = impute_mean(&numeric_column(df, name.as_ref())?);
        x.column_mut(j).assign(&column);
    }
    Ok(x)
}

fn split_key(seed: u64, row: usize) -> [u8; 32] {
    let mut h = blake3::Hasher::new();
    h.update(&seed.to_le_bytes());
    h.update(&(row as u64).to_le_bytes());
    *h.finalize().as_bytes()
}

/// Deterministic shuffle-split into `(train, test)` row indices.
///
/// Rows are ordered by a seeded hash of their index; the first
/// `ceil(n * test_fraction)` go to the test set. At least one row is always
/// kept for training. Both index lists come back sorted.
pub fn split_indices(n: usize, opts: SplitOptions) -> (Vec<usize>, Vec<usize>) {
    let fraction = opts.test_fraction.clamp(0.0, 1.0);
    let test_len = ((n as f64 * fraction).ceil() as usize).min(n.saturating_sub(1));

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_cached_key(|&row| split_key(opts.seed, row));

    let mut test = order[..test_len].to_vec();
    let mut train = order[test_len..].to_vec();
    test.sort_unstable();
    train.sort_unstable();
    (train, test)
}

/// Fit the consumption model on a prepared dataset and evaluate it on the
/// held-out split.
pub fn train(df: &DataFrame, opts: SplitOptions) -> Result<LinearModel, TrainingError> {
    let x = feature_matrix(df, &MeterFeatures::FIELD_NAMES)?;
    let y = impute_mean(&numeric_column(df, TARGET)?);
    tracing::info!(rows = x.nrows(), features = x.ncols(), "training data prepared");

    let (train_idx, test_idx) = split_indices(x.nrows(), opts);
    let names = MeterFeatures::FIELD_NAMES.iter().map(|n| n.to_string()).collect();
    let mut model = LinearModel::fit(
        &x.select(Axis(0), &train_idx),
        &y.select(Axis(0), &train_idx),
        names,
    )?;

    let predicted = model.predict_matrix(&x.select(Axis(0), &test_idx))?;
    model.metrics = RegressionMetrics::evaluate(y.select(Axis(0), &test_idx).view(), predicted.view());
    model.test_rows = test_idx.len();
    model.fitted_at = OffsetDateTime::now_utc().format(&Rfc3339).ok();

    match &model.metrics {
        Some(m) => {
            metrics::gauge!("model_test_rmse").set(m.rmse);
            metrics::gauge!("model_test_mae").set(m.mae);
            metrics::gauge!("model_test_r2").set(m.r2);
            tracing::info!(
                mse = m.mse,
                rmse = m.rmse,
                mae = m.mae,
                r2 = m.r2,
                train_rows = model.train_rows,
                test_rows = model.test_rows,
                "model trained"
            );
        }
        None => tracing::warn!(train_rows = model.train_rows, "model trained without a test split"),
    }

    Ok(model)
}
