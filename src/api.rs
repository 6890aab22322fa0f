//! HTTP surface: `/health`, `/predict`, `/sample-test`.

use crate::ensemble::Consensus;
use crate::error::{ServiceError, ValidationError};
use crate::service::{PredictionService, EXPECTED_SAMPLE_LABEL};
use crate::types::{
    ErrorBody, HealthReport, PredictResponse, SampleResponse, SERVICE_NAME, VERSION,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
}

impl AppState {
    pub fn new(service: PredictionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/sample-test", get(sample_test))
        .with_state(state)
}

/// An error already mapped onto the HTTP contract.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Only a missing field is a client error; every other failure is a 500.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match &err {
            ServiceError::Validation(e @ ValidationError::MissingField { .. }) => {
                warn!(error = %e, "Rejected prediction input");
                Self::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            _ => {
                error!(error = %err, "Prediction failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        error!(error = %rejection.body_text(), "Unreadable request body");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let service = &state.service;
    if service.is_ready() {
        (
            StatusCode::OK,
            Json(HealthReport {
                status: "healthy",
                service: SERVICE_NAME,
                model_loaded: true,
                models: service.model_names(),
                version: VERSION,
                message: Some("Crop Recommendation API is running!"),
                error: None,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthReport {
                status: "unhealthy",
                service: SERVICE_NAME,
                model_loaded: false,
                models: Vec::new(),
                version: VERSION,
                message: None,
                error: Some(ServiceError::Unavailable.to_string()),
            }),
        )
    }
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(input) = payload?;
    let predictions = state.service.predict(&input)?;
    let consensus = Consensus::from_predictions(&predictions);

    Ok(Json(PredictResponse {
        status: "success",
        predictions,
        consensus,
        input,
    }))
}

async fn sample_test(State(state): State<AppState>) -> Result<Json<SampleResponse>, ApiError> {
    let predictions = state.service.predict_sample()?;
    let consensus = Consensus::from_predictions(&predictions);

    Ok(Json(SampleResponse {
        status: "success",
        predictions,
        consensus,
        sample_data: PredictionService::sample_record().to_json(),
        expected: EXPECTED_SAMPLE_LABEL,
    }))
}
