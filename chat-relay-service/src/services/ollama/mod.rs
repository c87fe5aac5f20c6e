//! HTTP client for the local Ollama server.

pub mod payload;

pub use payload::{
    ChatRequest, ChatResponse, GenerateRequest, GenerateResponse, ModelTag, SamplingOptions,
    TagsResponse, UpstreamPayload, NO_RESPONSE_PLACEHOLDER,
};

use crate::config::OllamaConfig;
use crate::error::RelayError;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Thin wrapper over a pooled `reqwest::Client`. Cheap to clone.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
    tags_timeout: Duration,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> Result<Self, RelayError> {
        let client = Client::builder()
            .build()
            .map_err(|e| RelayError::Internal(anyhow::Error::new(e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout(),
            tags_timeout: config.tags_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base_url, endpoint)
    }

    /// Models installed on the server, from `GET /api/tags`.
    pub async fn list_models(&self) -> Result<Vec<ModelTag>, RelayError> {
        let response = self
            .client
            .get(self.api_url("tags"))
            .timeout(self.tags_timeout)
            .send()
            .await
            .map_err(RelayError::UpstreamTransport)?;

        let tags: TagsResponse = decode(response).await?;
        Ok(tags.models)
    }

    /// Whether `model` appears verbatim in the server's model list.
    pub async fn has_model(&self, model: &str) -> Result<bool, RelayError> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| m.name == model))
    }

    /// Send one non-streaming completion request and return the generated text.
    pub async fn complete(&self, payload: &UpstreamPayload) -> Result<String, RelayError> {
        let url = self.api_url(payload.endpoint());

        tracing::debug!(
            url = %url,
            model = %payload.model(),
            images = payload.image_count(),
            "Sending request to Ollama"
        );

        let request = match payload {
            UpstreamPayload::Generate(body) => self.client.post(&url).json(body),
            UpstreamPayload::Chat(body) => self.client.post(&url).json(body),
        };

        let response = request
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(RelayError::UpstreamTransport)?;

        let text = match payload {
            UpstreamPayload::Generate(_) => decode::<GenerateResponse>(response).await?.into_text(),
            UpstreamPayload::Chat(_) => decode::<ChatResponse>(response).await?.into_text(),
        };

        Ok(text)
    }
}

/// Reject non-200 answers with their body, then parse JSON.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RelayError> {
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(RelayError::UpstreamStatus {
            status: status.as_u16(),
            body,
        });
    }

    response.json().await.map_err(|e| {
        // A body read cut short by the request timeout is still a transport failure.
        if e.is_timeout() {
            RelayError::UpstreamTransport(e)
        } else {
            RelayError::UpstreamDecode(e)
        }
    })
}
