use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_VISION_MODEL: &str = "llava:latest";
const DEFAULT_TEXT_MODEL: &str = "llama3:latest";

/// Local inference can take minutes on CPU-only hosts.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_TAGS_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Name fragments identifying models that accept image input.
pub const KNOWN_VISION_FRAGMENTS: &[&str] = &[
    "llava",
    "llava:latest",
    "llama3.2-vision",
    "llama3.2-vision:latest",
    "llava:7b",
    "llava:13b",
    "llava:34b",
];

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub ollama: OllamaConfig,
    pub models: ModelConfig,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    /// Server root, without the `/api` suffix.
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub tags_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Model used when images are involved (e.g., llava:latest)
    pub vision_model: String,
    /// Model used for plain text prompts (e.g., llama3:latest)
    pub text_model: String,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(RelayConfig {
            common: common_config,
            ollama: OllamaConfig {
                base_url: get_env("OLLAMA_BASE_URL", Some(DEFAULT_OLLAMA_BASE_URL), is_prod)?,
                request_timeout_secs: get_env(
                    "OLLAMA_REQUEST_TIMEOUT_SECS",
                    Some(&DEFAULT_REQUEST_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
                tags_timeout_secs: get_env(
                    "OLLAMA_TAGS_TIMEOUT_SECS",
                    Some(&DEFAULT_TAGS_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_TAGS_TIMEOUT_SECS),
            },
            models: ModelConfig {
                vision_model: get_env("OLLAMA_VISION_MODEL", Some(DEFAULT_VISION_MODEL), is_prod)?,
                text_model: get_env("OLLAMA_TEXT_MODEL", Some(DEFAULT_TEXT_MODEL), is_prod)?,
            },
            max_upload_bytes: get_env(
                "RELAY_MAX_UPLOAD_BYTES",
                Some(&DEFAULT_MAX_UPLOAD_BYTES.to_string()),
                is_prod,
            )?
            .parse()
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        })
    }

    /// Configuration pointing at `base_url` with every other setting at its default.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        RelayConfig {
            common: core_config::Config::default(),
            ollama: OllamaConfig {
                base_url: base_url.into(),
                request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                tags_timeout_secs: DEFAULT_TAGS_TIMEOUT_SECS,
            },
            models: ModelConfig {
                vision_model: DEFAULT_VISION_MODEL.to_string(),
                text_model: DEFAULT_TEXT_MODEL.to_string(),
            },
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl OllamaConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tags_timeout(&self) -> Duration {
        Duration::from_secs(self.tags_timeout_secs)
    }
}

impl ModelConfig {
    /// True when `model` contains a known vision fragment or the configured
    /// vision model, compared case-insensitively.
    pub fn is_vision_model(&self, model: &str) -> bool {
        let model = model.to_lowercase();
        let configured = self.vision_model.to_lowercase();

        std::iter::once(configured.as_str())
            .chain(KNOWN_VISION_FRAGMENTS.iter().copied())
            .any(|fragment| model.contains(fragment))
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
