//! Conversation turns as exchanged with the front-end and Ollama's chat API.

use serde::{Deserialize, Serialize};

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    #[serde(default)]
    pub content: String,

    /// Base64 encoded images. Only read by Ollama on the final turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            images: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            images: None,
        }
    }
}

/// Parse the `chat_history` form field.
///
/// Anything that is not a JSON array of messages is logged and treated as no
/// history; so is an empty array.
pub fn parse_history(raw: &str) -> Option<Vec<Message>> {
    if raw.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Vec<Message>>(raw) {
        Ok(history) if history.is_empty() => None,
        Ok(history) => Some(history),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed chat_history");
            None
        }
    }
}

/// Content of the most recent user turn, if any.
pub fn latest_user_content(history: &[Message]) -> Option<&str> {
    history
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
}
