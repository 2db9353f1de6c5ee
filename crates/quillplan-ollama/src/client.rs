use std::io;
use std::time::Duration;

use quillplan_core::{ChatMessage, GenerationClient, Role, SchemaNode, TransportError};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::options::OllamaConfig;

const COERCION_PROMPT: &str = "Return ONLY valid JSON that matches the schema. \
Fill this skeleton without changing locked const values:\n";

/// Blocking client for `/api/chat` and `/api/generate`.
///
/// Each call negotiates in three tiers: structured chat with the schema as
/// `format`, then chat with an extra coercion message carrying the skeleton,
/// then `/api/generate` in plain JSON mode. The first reply that starts with
/// `{` wins; the last tier's reply is returned as-is.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    config: OllamaConfig,
    agent: ureq::Agent,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn options(&self) -> Value {
        json!({"temperature": self.config.temperature, "stop": self.config.stop})
    }

    fn chat_payload(&self, messages: &[ChatMessage], format: Value) -> Value {
        json!({
            "model": self.config.model,
            "messages": messages,
            "stream": false,
            "options": self.options(),
            "format": format,
        })
    }

    fn generate_payload(&self, prompt: String) -> Value {
        json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": self.options(),
            "format": "json",
        })
    }

    fn post(&self, path: &str, payload: &Value, timeout: Duration) -> Result<String, TransportError> {
        let url = self.config.endpoint(path);
        let response = self
            .agent
            .post(&url)
            .timeout(timeout)
            .send_json(payload)
            .map_err(|err| map_error(&url, err, timeout))?;
        let body: Value = response
            .into_json()
            .map_err(|err| TransportError::Response(format!("{url}: {err}")))?;
        Ok(response_text(&body))
    }
}

impl GenerationClient for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn generate(
        &self,
        messages: &[ChatMessage],
        schema: &SchemaNode,
        skeleton: &str,
        timeout: Duration,
    ) -> Result<String, TransportError> {
        let schema = schema.to_json();

        if self.config.structured_output {
            let text = self.post("api/chat", &self.chat_payload(messages, schema.clone()), timeout)?;
            if looks_like_object(&text) {
                return Ok(text);
            }
            debug!(model = %self.config.model, "structured chat reply was not an object");
        }

        let mut coerced = messages.to_vec();
        coerced.push(ChatMessage::user(format!("{COERCION_PROMPT}{skeleton}")));
        let format = if self.config.structured_output {
            schema
        } else {
            Value::String("json".to_string())
        };
        let text = self.post("api/chat", &self.chat_payload(&coerced, format), timeout)?;
        if looks_like_object(&text) {
            return Ok(text);
        }

        warn!(model = %self.config.model, "falling back to /api/generate");
        self.post("api/generate", &self.generate_payload(merge_prompt(&coerced)), timeout)
    }
}

fn looks_like_object(text: &str) -> bool {
    text.trim_start().starts_with('{')
}

/// `message.content` of a chat reply or `response` of a generate reply.
fn response_text(body: &Value) -> String {
    if let Some(message) = body.get("message") {
        return message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
    }
    body.get("response")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn merge_prompt(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|message| format!("{}: {}", role_label(message.role), message.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::System => "SYSTEM",
        Role::User => "USER",
        Role::Assistant => "ASSISTANT",
    }
}

fn map_error(url: &str, err: ureq::Error, timeout: Duration) -> TransportError {
    match err {
        ureq::Error::Status(status, _) => TransportError::Status {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(transport) => {
            if is_timeout(&transport) {
                TransportError::Timeout(timeout)
            } else {
                TransportError::Unreachable {
                    url: url.to_string(),
                    message: transport.to_string(),
                }
            }
        }
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    std::error::Error::source(transport)
        .and_then(|source| source.downcast_ref::<io::Error>())
        .is_some_and(|err| matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock))
}
