//! Model-selection policy and upstream payload construction.
//!
//! Everything here is a pure function of the parsed request and the model
//! configuration, so the whole decision can be tested without a server.

use crate::config::ModelConfig;
use crate::models::{latest_user_content, Message, Mode, ModelSelection};
use crate::services::ollama::{ChatRequest, GenerateRequest, SamplingOptions, UpstreamPayload};

/// Prompt used when the user sends only images.
pub const DEFAULT_IMAGE_PROMPT: &str =
    "What do you see in this image? Please describe it in detail.";

/// A validated inbound chat request with its images already encoded.
#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    pub message: String,
    pub mode: Mode,
    pub history: Option<Vec<Message>>,
    pub images: Vec<String>,
}

/// Everything decided for one request before talking to Ollama.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayPlan {
    pub selection: ModelSelection,
    /// The new message, or the derived substitute when none was sent.
    pub prompt: String,
    pub payload: UpstreamPayload,
}

/// | mode  | images | model  | images forwarded |
/// |-------|--------|--------|------------------|
/// | text  | any    | text   | no               |
/// | image | yes    | vision | yes              |
/// | image | no     | vision | no               |
/// | best  | yes    | vision | yes              |
/// | best  | no     | text   | no               |
///
/// Images are forwarded only when the chosen model is vision capable.
pub fn select_model(mode: Mode, has_images: bool, models: &ModelConfig) -> ModelSelection {
    let (model, forward) = match mode {
        Mode::Text => (&models.text_model, false),
        Mode::Image => (&models.vision_model, has_images),
        Mode::Best if has_images => (&models.vision_model, true),
        Mode::Best => (&models.text_model, false),
    };

    ModelSelection {
        model: model.clone(),
        images_attached: forward && models.is_vision_model(model),
    }
}

/// The prompt this request is about.
///
/// Falls back to the latest user turn of the history, then to
/// [`DEFAULT_IMAGE_PROMPT`] for image-only requests.
pub fn effective_prompt(
    message: &str,
    selection: &ModelSelection,
    history: Option<&[Message]>,
) -> String {
    if !message.is_empty() {
        return message.to_string();
    }

    match history {
        Some(history) if !history.is_empty() => latest_user_content(history)
            .unwrap_or_default()
            .to_string(),
        _ if selection.images_attached => DEFAULT_IMAGE_PROMPT.to_string(),
        _ => String::new(),
    }
}

/// Chat endpoint when there is history, generate endpoint otherwise.
pub fn build_payload(
    selection: &ModelSelection,
    prompt: &str,
    history: Option<Vec<Message>>,
    images: Vec<String>,
) -> UpstreamPayload {
    let images = Some(images).filter(|images| selection.images_attached && !images.is_empty());

    match history {
        Some(mut messages) if !messages.is_empty() => {
            if let (Some(images), Some(last)) = (images, messages.last_mut()) {
                last.images = Some(images);
            }
            UpstreamPayload::Chat(ChatRequest {
                model: selection.model.clone(),
                messages,
                stream: false,
                options: SamplingOptions::default(),
            })
        }
        _ => UpstreamPayload::Generate(GenerateRequest {
            model: selection.model.clone(),
            prompt: prompt.to_string(),
            images,
            stream: false,
            options: SamplingOptions::default(),
        }),
    }
}

/// Run the whole policy for one request.
pub fn plan(input: ChatInput, models: &ModelConfig) -> RelayPlan {
    let history = input.history.filter(|h| !h.is_empty());
    let selection = select_model(input.mode, !input.images.is_empty(), models);
    let prompt = effective_prompt(&input.message, &selection, history.as_deref());
    let payload = build_payload(&selection, &prompt, history, input.images);

    RelayPlan {
        selection,
        prompt,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;

    const VISION: &str = "llava:latest";
    const TEXT: &str = "llama3:latest";

    fn models() -> ModelConfig {
        RelayConfig::with_base_url("http://localhost:11434").models
    }

    fn images() -> Vec<String> {
        vec!["aW1hZ2Ux".to_string(), "aW1hZ2Uy".to_string()]
    }

    #[test]
    fn selection_table() {
        let models = models();
        let cases = [
            (Mode::Text, true, TEXT, false),
            (Mode::Text, false, TEXT, false),
            (Mode::Image, true, VISION, true),
            (Mode::Image, false, VISION, false),
            (Mode::Best, true, VISION, true),
            (Mode::Best, false, TEXT, false),
        ];

        for (mode, has_images, model, attached) in cases {
            let selection = select_model(mode, has_images, &models);
            assert_eq!(selection.model, model, "{mode} with images={has_images}");
            assert_eq!(
                selection.images_attached, attached,
                "{mode} with images={has_images}"
            );
        }
    }

    #[test]
    fn configured_vision_model_receives_images() {
        let mut models = models();
        models.vision_model = "gemma3:12b".to_string();

        let selection = select_model(Mode::Image, true, &models);
        assert_eq!(selection.model, "gemma3:12b");
        assert!(selection.images_attached);
    }

    #[test]
    fn payload_drops_images_when_selection_does_not_attach() {
        let selection = ModelSelection {
            model: "mistral:latest".to_string(),
            images_attached: false,
        };
        let payload = build_payload(&selection, "hi", None, images());
        assert_eq!(payload.image_count(), 0);
    }

    #[test]
    fn message_wins_over_fallbacks() {
        let selection = select_model(Mode::Best, true, &models());
        let history = vec![Message::user("older")];
        assert_eq!(
            effective_prompt("describe the sky", &selection, Some(&history)),
            "describe the sky"
        );
    }

    #[test]
    fn image_only_request_gets_default_prompt() {
        let selection = select_model(Mode::Best, true, &models());
        assert_eq!(effective_prompt("", &selection, None), DEFAULT_IMAGE_PROMPT);
    }

    #[test]
    fn text_mode_with_images_gets_no_default_prompt() {
        let selection = select_model(Mode::Text, true, &models());
        assert_eq!(effective_prompt("", &selection, None), "");
    }

    #[test]
    fn history_supplies_latest_user_prompt() {
        let history = vec![
            Message::user("what is rust?"),
            Message::assistant("a language"),
            Message::user("is it fast?"),
            Message::assistant("yes"),
        ];
        let selection = select_model(Mode::Best, false, &models());
        assert_eq!(
            effective_prompt("", &selection, Some(&history)),
            "is it fast?"
        );
    }

    #[test]
    fn generate_payload_carries_top_level_images() {
        let plan = plan(
            ChatInput {
                message: String::new(),
                mode: Mode::Image,
                history: None,
                images: images(),
            },
            &models(),
        );

        match plan.payload {
            UpstreamPayload::Generate(req) => {
                assert_eq!(req.model, VISION);
                assert_eq!(req.prompt, DEFAULT_IMAGE_PROMPT);
                assert_eq!(req.images, Some(images()));
                assert!(!req.stream);
            }
            other => panic!("expected generate payload, got {other:?}"),
        }
    }

    #[test]
    fn chat_payload_puts_images_on_last_message_only() {
        let history = vec![Message::user("look at this"), Message::user("and this")];
        let plan = plan(
            ChatInput {
                message: String::new(),
                mode: Mode::Best,
                history: Some(history),
                images: images(),
            },
            &models(),
        );

        assert_eq!(plan.prompt, "and this");
        match plan.payload {
            UpstreamPayload::Chat(req) => {
                assert_eq!(req.model, VISION);
                assert_eq!(req.messages.len(), 2);
                assert!(req.messages[0].images.is_none());
                assert_eq!(req.messages[1].images, Some(images()));
            }
            other => panic!("expected chat payload, got {other:?}"),
        }
    }

    #[test]
    fn text_mode_suppresses_images() {
        let plan = plan(
            ChatInput {
                message: "hello".to_string(),
                mode: Mode::Text,
                history: None,
                images: images(),
            },
            &models(),
        );

        assert_eq!(plan.selection.model, TEXT);
        assert_eq!(plan.payload.endpoint(), "generate");
        assert_eq!(plan.payload.image_count(), 0);
    }

    #[test]
    fn empty_history_uses_generate_endpoint() {
        let plan = plan(
            ChatInput {
                message: "hello".to_string(),
                mode: Mode::Best,
                history: Some(Vec::new()),
                images: Vec::new(),
            },
            &models(),
        );

        assert_eq!(plan.payload.endpoint(), "generate");
    }
}
