//! chat-relay-service: relays chat messages and images from a web front-end
//! to a local Ollama server, choosing between a text and a vision model.

pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::{Application, AppState};
