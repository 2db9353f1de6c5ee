use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::SchemaNode;

/// Chat role of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One `{role, content}` prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The generation service was unreachable, timed out, or answered garbage.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Unreachable { url: String, message: String },
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected response: {0}")]
    Response(String),
}

/// Trait implemented by text-generation backends.
///
/// Implementations may negotiate structured output however they like; the
/// planner only needs raw text that should contain a JSON object, or a
/// transport error.
pub trait GenerationClient {
    /// Backend identifier (e.g. `ollama`).
    fn name(&self) -> &str;

    fn generate(
        &self,
        messages: &[ChatMessage],
        schema: &SchemaNode,
        skeleton: &str,
        timeout: Duration,
    ) -> Result<String, TransportError>;
}
