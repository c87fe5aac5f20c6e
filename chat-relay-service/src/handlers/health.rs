use crate::dtos::{now_timestamp, HealthResponse};
use crate::startup::AppState;
use axum::{extract::State, Json};

/// Liveness check; reports the vision model the relay targets.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running",
        timestamp: now_timestamp(),
        model: state.config.models.vision_model.clone(),
    })
}
