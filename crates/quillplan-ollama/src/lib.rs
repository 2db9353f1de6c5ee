//! Ollama generation client.

pub mod client;
pub mod options;

pub use client::OllamaClient;
pub use options::{DEFAULT_BASE_URL, DEFAULT_MODEL, OllamaConfig};

pub use quillplan_core::GenerationClient;
