use std::{path::Path, sync::Arc};

use meter_client::domain::MeterFeatures;
use ndarray::ArrayView1;
use serde::Serialize;

use crate::model::{LinearModel, ModelError, Regressor};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictError {
    #[error("model not loaded")]
    ModelNotReady,
    #[error("prediction is not a finite number")]
    NonFinitePrediction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Predicted consumption, rounded to 2 decimal places.
    pub prediction: f64,
    pub units: &'static str,
}

/// Round half away from zero to 2 decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Scores single feature vectors with a model loaded once at startup.
///
/// Cloning shares the same read-only model.
#[derive(Clone, Default)]
pub struct Predictor {
    model: Option<Arc<dyn Regressor>>,
}

impl Predictor {
    /// A predictor with no model; every call reports `ModelNotReady`.
    pub fn not_ready() -> Self {
        Self::default()
    }

    /// Wrap a fitted model, checking it was trained on the served schema.
    pub fn with_model(model: Arc<dyn Regressor>) -> Result<Self, ModelError> {
        let actual = model.feature_names();
        if actual.iter().map(String::as_str).ne(MeterFeatures::FIELD_NAMES) {
            return Err(ModelError::SchemaMismatch {
                expected: MeterFeatures::FIELD_NAMES.iter().map(|n| n.to_string()).collect(),
                actual: actual.to_vec(),
            });
        }
        Ok(Self { model: Some(model) })
    }

    /// Load the model artifact at `path`. A missing or unusable artifact is
    /// logged and yields a predictor that is not ready.
    pub fn load(path: &Path) -> Self {
        let loaded = LinearModel::load(path).and_then(|m| Self::with_model(Arc::new(m)));
        match loaded {
            Ok(p) => {
                tracing::info!(path = %path.display(), "model loaded");
                p
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "model unavailable, serving not-ready");
                metrics::counter!("model_load_failures_total").increment(1);
                Self::not_ready()
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn predict(&self, features: &MeterFeatures) -> Result<Prediction, PredictError> {
        let model = self.model.as_ref().ok_or(PredictError::ModelNotReady)?;
        let vector = features.to_vector();
        let raw = model.predict(ArrayView1::from(&vector[..]));
        if !raw.is_finite() {
            return Err(PredictError::NonFinitePrediction);
        }

        Ok(Prediction {
            prediction: round2(raw),
            units: "kWh",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> MeterFeatures {
        MeterFeatures {
            voltage: 220.5,
            temperature: 25.0,
            power_factor: 0.95,
            load_kw: 2.5,
            frequency_hz: 50.0,
            hour: 12,
            day_of_week: 2,
            is_weekend: 0,
            voltage_flag: 1,
            pf_issue: 0,
            high_temp: 0,
            load_intensity: 10.5,
        }
    }

    fn linear(intercept: f64, load_kw_coef: f64) -> LinearModel {
        let mut coefficients = vec![0.0; 12];
        coefficients[3] = load_kw_coef;
        LinearModel {
            feature_names: MeterFeatures::FIELD_NAMES.iter().map(|n| n.to_string()).collect(),
            intercept,
            coefficients,
            metrics: None,
            train_rows: 0,
            test_rows: 0,
            fitted_at: None,
        }
    }

    #[test]
    fn no_model_is_not_ready() {
        let p = Predictor::not_ready();
        assert!(!p.is_ready());
        assert_eq!(p.predict(&features()), Err(PredictError::ModelNotReady));
    }

    #[test]
    fn prediction_is_rounded_to_two_decimals() {
        let p = Predictor::with_model(Arc::new(linear(1.0, 1.234567))).unwrap();
        let out = p.predict(&features()).unwrap();
        // 1.0 + 2.5 * 1.234567 = 4.0864175
        assert_eq!(out.prediction, 4.09);
        assert_eq!(out.units, "kWh");
    }

    #[test]
    fn overflowing_prediction_is_an_error() {
        let mut m = linear(0.0, 0.0);
        m.coefficients[11] = f64::MAX;
        let p = Predictor::with_model(Arc::new(m)).unwrap();
        // load_intensity 10.5 * f64::MAX overflows to infinity.
        assert_eq!(p.predict(&features()), Err(PredictError::NonFinitePrediction));

        let mut input = features();
        input.load_intensity = f64::NAN;
        let p = Predictor::with_model(Arc::new(linear(1.0, 1.0))).unwrap();
        assert_eq!(p.predict(&input), Err(PredictError::NonFinitePrediction));
    }

    #[test]
    fn model_with_foreign_schema_is_rejected() {
        let mut m = linear(0.0, 0.0);
        m.feature_names.swap(0, 1);
        assert!(matches!(
            Predictor::with_model(Arc::new(m)),
            Err(ModelError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn unreadable_artifact_loads_as_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let p = Predictor::load(&dir.path().join("absent.json"));
        assert!(!p.is_ready());

        let path = dir.path().join("model.json");
        linear(2.0, 0.0).save(&path).unwrap();
        let p = Predictor::load(&path);
        assert!(p.is_ready());
        assert_eq!(p.predict(&features()).unwrap().prediction, 2.0);
    }

    #[test]
    fn round2_examples() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(-3.14159), -3.14);
        assert_eq!(round2(500000.0), 500000.0);
    }
}
