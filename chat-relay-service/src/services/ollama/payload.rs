//! Request and response bodies of Ollama's `/api/generate`, `/api/chat` and
//! `/api/tags` endpoints.

use crate::models::Message;
use serde::{Deserialize, Serialize};

/// Returned to the user when Ollama answers without any text.
pub const NO_RESPONSE_PLACEHOLDER: &str = "Sorry, I couldn't generate a response.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

/// Single-turn body for `/api/generate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    pub stream: bool,
    pub options: SamplingOptions,
}

/// Multi-turn body for `/api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
    pub options: SamplingOptions,
}

/// What gets sent upstream for one inbound chat request.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamPayload {
    Generate(GenerateRequest),
    Chat(ChatRequest),
}

impl UpstreamPayload {
    pub fn endpoint(&self) -> &'static str {
        match self {
            UpstreamPayload::Generate(_) => "generate",
            UpstreamPayload::Chat(_) => "chat",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            UpstreamPayload::Generate(req) => &req.model,
            UpstreamPayload::Chat(req) => &req.model,
        }
    }

    pub fn image_count(&self) -> usize {
        let images = match self {
            UpstreamPayload::Generate(req) => req.images.as_ref(),
            UpstreamPayload::Chat(req) => req.messages.last().and_then(|m| m.images.as_ref()),
        };
        images.map_or(0, Vec::len)
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl GenerateResponse {
    pub fn into_text(self) -> String {
        self.response
            .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string())
    }
}

impl ChatResponse {
    pub fn into_text(self) -> String {
        self.message
            .and_then(|m| m.content)
            .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

/// One entry of `/api/tags`; Ollama sends more fields, only these are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTag {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}
