//! Failure kinds of a relayed chat request.
//!
//! Upstream failures are reported back to the user as chat text; only
//! validation and internal failures surface as HTTP error statuses.

use anyhow::anyhow;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    Validation(String),

    #[error("Error connecting to Ollama: {0}")]
    UpstreamTransport(#[source] reqwest::Error),

    #[error("Error: API returned status code {status} - {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Unexpected error: {0}")]
    UpstreamDecode(#[source] reqwest::Error),

    #[error("Server error: {0}")]
    Internal(anyhow::Error),
}

impl RelayError {
    /// Whether the failure came from talking to the inference server.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            RelayError::UpstreamTransport(_)
                | RelayError::UpstreamStatus { .. }
                | RelayError::UpstreamDecode(_)
        )
    }

    /// Turn upstream failures into the text shown to the user; anything else
    /// is handed back for HTTP error mapping.
    pub fn into_chat_text(self) -> Result<String, RelayError> {
        if self.is_upstream() {
            Ok(self.to_string())
        } else {
            Err(self)
        }
    }
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Validation(msg) => AppError::BadRequest(anyhow!(msg)),
            other => AppError::InternalError(anyhow!(other.to_string())),
        }
    }
}
