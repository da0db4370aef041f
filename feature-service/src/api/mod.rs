//! HTTP prediction endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use meter_client::domain::MeterFeatures;
use serde::Serialize;

use crate::predictor::{PredictError, Prediction, Predictor};

/// Application-scoped state shared read-only by every request.
pub struct AppState {
    pub predictor: Predictor,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Self {
        Self { predictor }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = match self {
            PredictError::ModelNotReady => StatusCode::SERVICE_UNAVAILABLE,
            PredictError::NonFinitePrediction => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(features): Json<MeterFeatures>,
) -> Result<Json<Prediction>, PredictError> {
    match state.predictor.predict(&features) {
        Ok(p) => {
            metrics::counter!("predictions_served_total").increment(1);
            Ok(Json(p))
        }
        Err(e @ PredictError::ModelNotReady) => {
            metrics::counter!("predictions_not_ready_total").increment(1);
            tracing::warn!(error = %e, "prediction requested before a model was loaded");
            Err(e)
        }
        Err(e @ PredictError::NonFinitePrediction) => {
            metrics::counter!("predictions_rejected_total").increment(1);
            tracing::warn!(error = %e, load_intensity = features.load_intensity, "prediction rejected");
            Err(e)
        }
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    model_loaded: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        model_loaded: state.predictor.is_ready(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinearModel;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn body() -> serde_json::Value {
        serde_json::json!({
            "voltage": 220.5,
            "temperature": 25.0,
            "power_factor": 0.95,
            "load_kw": 2.5,
            "frequency_hz": 50.0,
            "hour": 12,
            "day_of_week": 2,
            "is_weekend": 0,
            "voltage_flag": 1,
            "pf_issue": 0,
            "high_temp": 0,
            "load_intensity": 10.5
        })
    }

    fn ready_app() -> Router {
        app_with_intensity_coef(0.5)
    }

    fn app_with_intensity_coef(coef: f64) -> Router {
        let mut coefficients = vec![0.0; 12];
        coefficients[11] = coef;
        let model = LinearModel {
            feature_names: MeterFeatures::FIELD_NAMES.iter().map(|n| n.to_string()).collect(),
            intercept: 0.333,
            coefficients,
            metrics: None,
            train_rows: 0,
            test_rows: 0,
            fitted_at: None,
        };
        let predictor = Predictor::with_model(Arc::new(model)).unwrap();
        router(Arc::new(AppState::new(predictor)))
    }

    fn post_json(value: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap()
    }

    async fn json_of(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn predict_returns_rounded_kwh() {
        let resp = ready_app().oneshot(post_json(&body())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // 0.333 + 0.5 * 10.5 = 5.583
        let json = json_of(resp).await;
        assert_eq!(json, serde_json::json!({"prediction": 5.58, "units": "kWh"}));
    }

    #[tokio::test]
    async fn predict_without_model_is_service_unavailable() {
        let app = router(Arc::new(AppState::new(Predictor::not_ready())));
        let resp = app.oneshot(post_json(&body())).await.unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_of(resp).await, serde_json::json!({"detail": "model not loaded"}));
    }

    #[tokio::test]
    async fn non_finite_prediction_is_unprocessable() {
        let mut extreme = body();
        extreme["load_intensity"] = serde_json::json!(1e300);
        let resp = app_with_intensity_coef(1e10).oneshot(post_json(&extreme)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            json_of(resp).await,
            serde_json::json!({"detail": "prediction is not a finite number"})
        );
    }

    #[tokio::test]
    async fn malformed_records_are_rejected() {
        let mut missing = body();
        missing.as_object_mut().unwrap().remove("hour");
        let resp = ready_app().oneshot(post_json(&missing)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let mut wrong_type = body();
        wrong_type["voltage"] = serde_json::json!("high");
        let resp = ready_app().oneshot(post_json(&wrong_type)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn health_reports_model_state() {
        let app = router(Arc::new(AppState::new(Predictor::not_ready())));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_of(resp).await,
            serde_json::json!({"status": "ok", "model_loaded": false})
        );
    }
}
