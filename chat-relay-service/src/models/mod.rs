//! Domain models for the chat relay.

pub mod conversation;
pub mod mode;

pub use conversation::{latest_user_content, parse_history, Message, Role};
pub use mode::{Mode, ModelSelection};
