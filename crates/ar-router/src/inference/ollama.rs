//! Ollama adapter for the on-device model.
//!
//! `acquire` loads the model and `release` unloads it (`keep_alive: 0`),
//! so each inference starts from a freshly initialized model. Inference
//! goes through `/api/chat` with JSON output and temperature 0.

use std::sync::Arc;
use std::time::Duration;

use ar_protocol::ToolSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{InferenceError, LocalModel, ModelOutput, parse_model_output, system_prompt};

/// Configuration for the local Ollama inference endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    /// Ollama HTTP API base URL.
    #[serde(default = "default_host")]
    pub host: String,
    /// Model to use for inference.
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Whether the local-model tier is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Unload and reload the model around every inference.
    #[serde(default = "default_reload_per_call")]
    pub reload_per_call: bool,
}

fn default_host() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "gemma3:270m".into()
}
fn default_timeout_secs() -> u64 {
    5
}
fn default_enabled() -> bool {
    true
}
fn default_reload_per_call() -> bool {
    true
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            enabled: default_enabled(),
            reload_per_call: default_reload_per_call(),
        }
    }
}

/// Ollama chat API request body.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    format: &'a str,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

/// Ollama chat API response (only fields we need).
#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Load/unload request for `/api/generate`.
#[derive(Serialize)]
struct LifecycleRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<u32>,
}

/// Client for the local Ollama endpoint.
pub struct OllamaClient {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::Unavailable(format!("failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    async fn post_generate(&self, keep_alive: Option<u32>) -> Result<(), InferenceError> {
        let url = format!("{}/api/generate", self.config.host);
        let body = LifecycleRequest {
            model: &self.config.model,
            keep_alive,
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(InferenceError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl LocalModel for OllamaClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn acquire(&self) -> Result<(), InferenceError> {
        if !self.config.reload_per_call {
            return Ok(());
        }
        self.post_generate(None).await.inspect_err(|e| {
            tracing::warn!(model = %self.config.model, error = %e, "ollama model load failed");
        })
    }

    async fn infer(&self, prompt: &str, tools: &[Arc<ToolSpec>]) -> Result<ModelOutput, InferenceError> {
        let url = format!("{}/api/chat", self.config.host);
        let system = system_prompt(tools);

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            format: "json",
            stream: false,
            options: ChatOptions { temperature: 0.0 },
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            tracing::warn!(error = %e, "ollama request failed");
            InferenceError::Http(e.to_string())
        })?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "ollama returned non-200");
            return Err(InferenceError::Status(response.status().as_u16()));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to parse ollama response body");
            InferenceError::InvalidOutput(e.to_string())
        })?;

        let Some(message) = chat.message else {
            return Ok(ModelOutput::empty());
        };

        parse_model_output(&message.content).inspect_err(|e| {
            tracing::warn!(error = %e, "ollama returned invalid JSON");
        })
    }

    async fn release(&self) -> Result<(), InferenceError> {
        if !self.config.reload_per_call {
            return Ok(());
        }
        self.post_generate(Some(0)).await
    }
}
