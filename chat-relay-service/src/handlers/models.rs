use crate::dtos::{CheckModelResponse, ModelSummary, ModelsResponse};
use crate::error::RelayError;
use crate::startup::AppState;
use anyhow::anyhow;
use axum::{extract::State, Json};
use service_core::error::AppError;

/// Reports whether Ollama is reachable and has the vision model installed.
///
/// Always answers 200; problems are described in the body.
pub async fn check_model(State(state): State<AppState>) -> Json<CheckModelResponse> {
    let target = &state.config.models.vision_model;

    let response = match state.ollama.list_models().await {
        Ok(models) => {
            let names: Vec<String> = models.into_iter().map(|m| m.name).collect();
            CheckModelResponse {
                available: names.iter().any(|name| name == target),
                ollama_running: Some(true),
                available_models: Some(names),
                target_model: Some(target.clone()),
                error: None,
            }
        }
        Err(RelayError::UpstreamTransport(e)) => {
            tracing::warn!(error = %e, "Ollama unreachable during model check");
            CheckModelResponse {
                available: false,
                ollama_running: Some(false),
                error: Some(format!("Cannot connect to Ollama server: {}", e)),
                ..Default::default()
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Ollama answered model check with an error");
            CheckModelResponse {
                available: false,
                error: Some("Ollama server not responding".to_string()),
                ..Default::default()
            }
        }
    };

    Json(response)
}

/// Proxies `/api/tags`, keeping only name and size of each model.
pub async fn list_models(State(state): State<AppState>) -> Result<Json<ModelsResponse>, AppError> {
    let models = state.ollama.list_models().await.map_err(|e| match e {
        RelayError::UpstreamStatus { status, .. } => {
            AppError::InternalError(anyhow!("Could not fetch models: {}", status))
        }
        other => AppError::from(other),
    })?;

    Ok(Json(ModelsResponse {
        models: models.into_iter().map(ModelSummary::from).collect(),
    }))
}
