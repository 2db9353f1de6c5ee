use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.3:70b";

/// Connection and decoding options for an Ollama server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    /// Send the schema as `format`. Disable for servers that ignore it.
    pub structured_output: bool,
    pub temperature: f64,
    pub stop: Vec<String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            structured_output: true,
            temperature: 0.0,
            stop: vec!["```".to_string(), "</json>".to_string(), "\n\n\n".to_string()],
        }
    }
}

impl OllamaConfig {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}
