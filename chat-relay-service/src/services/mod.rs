pub mod images;
pub mod ollama;
pub mod routing;

pub use images::{encode_image, encode_uploads, ImageError, Upload};
pub use ollama::OllamaClient;
pub use routing::{plan, ChatInput, RelayPlan};
