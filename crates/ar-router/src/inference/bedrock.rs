//! AWS Bedrock adapter for the cloud model, via the Converse API.
//!
//! Model-agnostic (Nova Lite, Claude, etc.). Credentials and region come
//! from the standard AWS environment chain. Timeouts are enforced by the
//! cloud cascade tier, not here.

use std::sync::Arc;

use ar_protocol::ToolSpec;
use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use aws_sdk_bedrockruntime::types::{ContentBlock, ConversationRole, ConverseOutput, Message, SystemContentBlock};
use serde::Deserialize;

use super::{CloudModel, InferenceError, ModelOutput, parse_model_output, system_prompt};

/// Configuration for the Bedrock cloud tier.
#[derive(Debug, Clone, Deserialize)]
pub struct BedrockConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Bedrock model ID (e.g., "us.amazon.nova-lite-v1:0").
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Overrides the region from the AWS environment.
    #[serde(default)]
    pub region: Option<String>,
}

fn default_model_id() -> String {
    "us.amazon.nova-lite-v1:0".into()
}
fn default_timeout_secs() -> u64 {
    5
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model_id: default_model_id(),
            timeout_secs: default_timeout_secs(),
            region: None,
        }
    }
}

impl BedrockConfig {
    /// Apply `BEDROCK_*` environment overrides on top of file values.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(enabled) = lookup("BEDROCK_ENABLED") {
            self.enabled = matches!(enabled.trim(), "1" | "true" | "TRUE" | "yes");
        }
        if let Some(model_id) = lookup("BEDROCK_MODEL_ID") {
            self.model_id = model_id;
        }
        if let Some(secs) = lookup("BEDROCK_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.timeout_secs = secs;
        }
        if let Some(region) = lookup("BEDROCK_REGION") {
            self.region = Some(region);
        }
    }
}

/// Bedrock Converse API client.
pub struct BedrockEngine {
    client: BedrockClient,
    config: BedrockConfig,
}

impl BedrockEngine {
    /// Create a new engine with a pre-built Bedrock client.
    pub fn new(client: BedrockClient, config: BedrockConfig) -> Self {
        Self { client, config }
    }

    /// Build a client from the AWS environment.
    pub async fn from_env(config: BedrockConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;
        Self::new(BedrockClient::new(&sdk_config), config)
    }

    /// Call the Converse API and return the first text block.
    async fn call_converse(&self, prompt: &str, system: String) -> Result<Option<String>, InferenceError> {
        let user_message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(prompt.to_string()))
            .build()
            .map_err(|e| InferenceError::InvalidOutput(format!("failed to build message: {e}")))?;

        let response = self
            .client
            .converse()
            .model_id(&self.config.model_id)
            .system(SystemContentBlock::Text(system))
            .messages(user_message)
            .send()
            .await
            .map_err(|e| InferenceError::Unavailable(format!("bedrock converse error: {e}")))?;

        let Some(output) = response.output() else {
            return Ok(None);
        };

        let text = match output {
            ConverseOutput::Message(msg) => msg.content().iter().find_map(|block| {
                if let ContentBlock::Text(t) = block {
                    Some(t.clone())
                } else {
                    None
                }
            }),
            _ => None,
        };
        Ok(text)
    }
}

#[async_trait]
impl CloudModel for BedrockEngine {
    fn name(&self) -> &str {
        &self.config.model_id
    }

    async fn infer(&self, prompt: &str, tools: &[Arc<ToolSpec>]) -> Result<ModelOutput, InferenceError> {
        let Some(raw_text) = self.call_converse(prompt, system_prompt(tools)).await? else {
            tracing::debug!("bedrock returned no text content");
            return Ok(ModelOutput::empty());
        };
        parse_model_output(&raw_text)
    }
}
