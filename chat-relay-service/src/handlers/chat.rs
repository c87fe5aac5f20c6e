use crate::dtos::{now_timestamp, ChatReply};
use crate::error::RelayError;
use crate::models::{parse_history, Message, Mode};
use crate::services::routing::{self, ChatInput};
use crate::services::{encode_uploads, Upload};
use crate::startup::AppState;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use service_core::error::AppError;

const EMPTY_REQUEST_MESSAGE: &str = "Please provide a message or upload an image";

/// Fields of the `POST /api/chat` multipart form.
#[derive(Debug, Default)]
struct ChatForm {
    message: String,
    mode: Mode,
    uploads: Vec<Upload>,
    history: Option<Vec<Message>>,
}

impl ChatForm {
    async fn read(multipart: &mut Multipart, limit: usize) -> Result<Self, RelayError> {
        let mut form = ChatForm::default();
        let invalid = |e: MultipartError| invalid_form(e, limit);

        while let Some(field) = multipart.next_field().await.map_err(invalid)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("message") => {
                    form.message = field_text(field, limit).await?.trim().to_string()
                }
                Some("mode") => {
                    form.mode = field_text(field, limit).await?.parse().unwrap_or_default()
                }
                Some("chat_history") => {
                    form.history = parse_history(&field_text(field, limit).await?)
                }
                Some("images") if field.file_name().is_none() => {
                    tracing::debug!("Ignoring images part without a file name")
                }
                Some("images") => {
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(invalid)?.to_vec();
                    form.uploads.push(Upload {
                        file_name,
                        content_type,
                        data,
                    });
                }
                other => tracing::debug!(field = ?other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    fn is_empty(&self) -> bool {
        self.message.is_empty() && self.uploads.is_empty() && self.history.is_none()
    }
}

async fn field_text(field: Field<'_>, limit: usize) -> Result<String, RelayError> {
    field.text().await.map_err(|e| invalid_form(e, limit))
}

fn invalid_form(e: MultipartError, limit: usize) -> RelayError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return RelayError::Validation(format!(
            "Upload too large: request body exceeds the {} byte limit",
            limit
        ));
    }
    RelayError::Validation(format!("Invalid form data: {}", e.body_text()))
}

/// Relay one chat turn to Ollama.
///
/// Upstream failures come back as the `response` text with status 200.
pub async fn chat(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ChatReply>, AppError> {
    let limit = state.config.max_upload_bytes;
    let mut multipart = multipart.map_err(|rejection| {
        RelayError::Validation(format!("Invalid form data: {}", rejection.body_text()))
    })?;
    let form = ChatForm::read(&mut multipart, limit).await?;

    if form.is_empty() {
        return Err(RelayError::Validation(EMPTY_REQUEST_MESSAGE.to_string()).into());
    }

    let ChatForm {
        message,
        mode,
        uploads,
        history,
    } = form;

    let images = if uploads.is_empty() {
        Vec::new()
    } else {
        tokio::task::spawn_blocking(move || encode_uploads(&uploads))
            .await
            .map_err(|e| RelayError::Internal(anyhow::Error::new(e)))?
    };
    let images_processed = images.len();

    let plan = routing::plan(
        ChatInput {
            message,
            mode,
            history,
            images,
        },
        &state.config.models,
    );

    tracing::info!(
        %mode,
        model = %plan.selection.model,
        endpoint = plan.payload.endpoint(),
        images_processed,
        images_attached = plan.selection.images_attached,
        "Relaying chat request"
    );
    tracing::debug!(prompt = %plan.prompt, "Effective prompt");

    let response = match state.ollama.complete(&plan.payload).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, model = %plan.selection.model, "Ollama request failed");
            e.into_chat_text()?
        }
    };

    Ok(Json(ChatReply {
        response,
        timestamp: now_timestamp(),
        images_processed,
        model_used: plan.selection.model,
    }))
}
