//! JSON bodies returned by the HTTP API.

use crate::services::ollama::ModelTag;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub timestamp: String,
    pub images_processed: usize,
    pub model_used: String,
}

/// Result of `GET /api/check-model`. Fields absent from a given outcome are
/// left out of the JSON.
#[derive(Debug, Default, Serialize)]
pub struct CheckModelResponse {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_running: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_models: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelSummary>,
}

#[derive(Debug, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub size: u64,
}

impl From<ModelTag> for ModelSummary {
    fn from(tag: ModelTag) -> Self {
        Self {
            name: tag.name,
            size: tag.size,
        }
    }
}

/// Current time in RFC 3339, as used by every response timestamp.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
