//! Ollama generation backend.
//!
//! Ollama runs models locally without API keys.
//! Install from: https://ollama.ai

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{RedlineError, Result};

use super::backend::{GenerationBackend, GenerationCall, GenerationError};

/// Default Ollama host.
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Which Ollama endpoint to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OllamaEndpoint {
    /// `/api/generate`, single prompt with a `system` field.
    #[default]
    Generate,
    /// `/api/chat`, system and user messages.
    Chat,
}

impl OllamaEndpoint {
    fn path(&self) -> &'static str {
        match self {
            OllamaEndpoint::Generate => "/api/generate",
            OllamaEndpoint::Chat => "/api/chat",
        }
    }
}

impl std::str::FromStr for OllamaEndpoint {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generate" => Ok(OllamaEndpoint::Generate),
            "chat" => Ok(OllamaEndpoint::Chat),
            other => Err(format!("Unknown endpoint: {}. Use generate or chat.", other)),
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// Backend for a local Ollama server.
pub struct OllamaBackend {
    client: Client,
    host: String,
    endpoint: OllamaEndpoint,
}

impl OllamaBackend {
    /// Create a backend for the host in `OLLAMA_HOST`, or the default host.
    pub fn new() -> Result<Self> {
        Self::with_host(None, OllamaEndpoint::default())
    }

    /// Create a backend for an explicit host. `None` falls back to
    /// `OLLAMA_HOST`, then to `http://localhost:11434`.
    pub fn with_host(host: Option<&str>, endpoint: OllamaEndpoint) -> Result<Self> {
        // Deadlines are enforced by the client; this only bounds connection setup.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| RedlineError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let host = host
            .map(str::to_string)
            .or_else(|| std::env::var("OLLAMA_HOST").ok())
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        Ok(Self {
            client,
            host: normalize_host(&host),
            endpoint,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn endpoint(&self) -> OllamaEndpoint {
        self.endpoint
    }

    fn url(&self) -> String {
        format!("{}{}", self.host, self.endpoint.path())
    }

    fn body(&self, call: &GenerationCall) -> Value {
        let options = json!({
            "temperature": call.options.temperature,
            "top_p": call.options.top_p,
            "num_predict": call.options.num_predict,
            "num_ctx": call.options.num_ctx
        });

        match self.endpoint {
            OllamaEndpoint::Generate => json!({
                "model": call.model,
                "prompt": call.prompt,
                "system": call.system,
                "stream": false,
                "options": options
            }),
            OllamaEndpoint::Chat => json!({
                "model": call.model,
                "stream": false,
                "options": options,
                "messages": [
                    {
                        "role": "system",
                        "content": call.system
                    },
                    {
                        "role": "user",
                        "content": call.prompt
                    }
                ]
            }),
        }
    }

    fn decode(&self, body: &str) -> std::result::Result<String, GenerationError> {
        let text = match self.endpoint {
            OllamaEndpoint::Generate => {
                serde_json::from_str::<GenerateResponse>(body)
                    .map_err(|e| GenerationError::Decode(e.to_string()))?
                    .response
            }
            OllamaEndpoint::Chat => {
                serde_json::from_str::<ChatResponse>(body)
                    .map_err(|e| GenerationError::Decode(e.to_string()))?
                    .message
                    .content
            }
        };

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Accept bare `host:port` as well as full URLs.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(&self, call: &GenerationCall) -> std::result::Result<String, GenerationError> {
        let url = self.url();
        debug!(url = %url, model = %call.model, "sending Ollama request");

        let response = self
            .client
            .post(&url)
            .json(&self.body(call))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Connect(format!(
                        "{} (is Ollama running? Start with: ollama serve)",
                        self.host
                    ))
                } else {
                    GenerationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !status.is_success() {
            if status.as_u16() == 404 || body.contains("not found") {
                return Err(GenerationError::ModelNotFound(call.model.clone()));
            }
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        self.decode(&body)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
