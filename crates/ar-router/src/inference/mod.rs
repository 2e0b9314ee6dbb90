//! Model boundaries: the on-device model and the cloud model.
//!
//! Both are opaque capability providers. The router only sends a prompt
//! plus the tool schemas on offer and reads back proposed calls.

pub mod bedrock;
pub mod mock;
pub mod ollama;

use std::sync::Arc;

use ar_protocol::{ArgMap, ToolSpec};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("model unavailable: {0}")]
    Unavailable(String),

    #[error("transport error: {0}")]
    Http(String),

    #[error("model endpoint returned status {0}")]
    Status(u16),

    #[error("invalid model output: {0}")]
    InvalidOutput(String),
}

/// One tool call proposed by a model. Arguments are raw, unvalidated.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCall {
    pub name: String,
    pub arguments: ArgMap,
}

/// Structured model output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelOutput {
    pub calls: Vec<ModelCall>,
    /// Model's self-reported confidence in `[0, 1]`.
    pub confidence: f64,
    /// The model asked to hand the request off to a larger model.
    pub cloud_handoff: bool,
}

impl ModelOutput {
    pub fn single(name: &str, arguments: Value, confidence: f64) -> Self {
        Self {
            calls: vec![ModelCall {
                name: name.to_string(),
                arguments: arguments.as_object().cloned().unwrap_or_default(),
            }],
            confidence,
            cloud_handoff: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Stateful on-device model with an explicit lifecycle.
///
/// `acquire` must leave the model in a clean state (full reinitialization)
/// and `release` must tear it down. Not safe for concurrent use; wrap it in
/// a [`LocalModelHandle`].
#[async_trait]
pub trait LocalModel: Send + Sync {
    fn name(&self) -> &str;

    async fn acquire(&self) -> Result<(), InferenceError>;

    async fn infer(&self, prompt: &str, tools: &[Arc<ToolSpec>]) -> Result<ModelOutput, InferenceError>;

    async fn release(&self) -> Result<(), InferenceError>;
}

/// Network-hosted model. Timeouts are applied by the caller.
#[async_trait]
pub trait CloudModel: Send + Sync {
    fn name(&self) -> &str;

    async fn infer(&self, prompt: &str, tools: &[Arc<ToolSpec>]) -> Result<ModelOutput, InferenceError>;
}

/// Single-owner wrapper around a [`LocalModel`].
///
/// Every call runs acquire → infer → release under an exclusive lease.
/// Release runs on every exit path; if the future is dropped mid-inference
/// a guard schedules the release on the runtime, still holding the lease.
pub struct LocalModelHandle {
    model: Arc<dyn LocalModel>,
    lease: Arc<Mutex<()>>,
}

struct ReleaseGuard {
    pending: Option<(Arc<dyn LocalModel>, OwnedMutexGuard<()>)>,
}

impl ReleaseGuard {
    fn disarm(&mut self) -> Option<(Arc<dyn LocalModel>, OwnedMutexGuard<()>)> {
        self.pending.take()
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        let Some((model, lease)) = self.pending.take() else {
            return;
        };
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                if let Err(e) = model.release().await {
                    tracing::warn!(error = %e, "local model release after cancellation failed");
                }
                drop(lease);
            });
        }
    }
}

impl LocalModelHandle {
    pub fn new(model: Arc<dyn LocalModel>) -> Self {
        Self {
            model,
            lease: Arc::new(Mutex::new(())),
        }
    }

    pub fn name(&self) -> &str {
        self.model.name()
    }

    /// Run one inference in a freshly acquired model.
    pub async fn infer(&self, prompt: &str, tools: &[Arc<ToolSpec>]) -> Result<ModelOutput, InferenceError> {
        let lease = Arc::clone(&self.lease).lock_owned().await;
        self.model.acquire().await?;

        let mut guard = ReleaseGuard {
            pending: Some((Arc::clone(&self.model), lease)),
        };
        let result = self.model.infer(prompt, tools).await;

        if let Some((model, lease)) = guard.disarm() {
            if let Err(e) = model.release().await {
                tracing::warn!(model = model.name(), error = %e, "local model release failed");
            }
            drop(lease);
        }
        result
    }
}

/// System prompt listing the offered tools and the expected JSON reply.
pub fn system_prompt(tools: &[Arc<ToolSpec>]) -> String {
    let mut prompt = String::from(
        "You are a function-calling assistant for a personal device. \
         Map the user's request to exactly one tool call.\n\nAvailable tools:\n\n",
    );
    for (i, spec) in tools.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {}: {}\n   Parameters: {}\n\n",
            i + 1,
            spec.name,
            spec.description,
            spec.to_json_schema()
        ));
    }
    prompt.push_str(
        "Respond with ONLY a JSON object (no markdown, no explanation):\n\
         {\"tool_name\": \"<name>\", \"tool_args\": {<args>}, \"confidence\": <0.0-1.0>}\n\n\
         Times are 24-hour integers (3pm → hour 15, minute 0). Durations are whole minutes.\n\
         Copy names and message text exactly as the user wrote them.\n\n\
         If the request doesn't match any tool, respond with:\n\
         {\"tool_name\": null, \"tool_args\": {}, \"confidence\": 0.0}",
    );
    prompt
}

/// Extract JSON from model output that may be wrapped in markdown code blocks.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    trimmed
}

/// One call in the JSON reply.
#[derive(Debug, Deserialize)]
struct RawCall {
    tool_name: Option<String>,
    #[serde(default, alias = "arguments")]
    tool_args: Value,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Parse raw model text into a [`ModelOutput`].
///
/// Accepts a single call object or `{"calls": [...]}`. A `null` tool name
/// yields an output with no calls.
pub fn parse_model_output(text: &str) -> Result<ModelOutput, InferenceError> {
    let invalid = |e: serde_json::Error| InferenceError::InvalidOutput(format!("{e}: {text}"));

    let value: Value = serde_json::from_str(extract_json(text)).map_err(invalid)?;
    let Value::Object(reply) = value else {
        return Err(InferenceError::InvalidOutput(format!("expected a JSON object: {text}")));
    };

    let raw_calls: Vec<RawCall> = match reply.get("calls") {
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|item| serde_json::from_value(item.clone()))
            .collect::<Result<_, _>>()
            .map_err(invalid)?,
        _ => vec![serde_json::from_value(Value::Object(reply.clone())).map_err(invalid)?],
    };

    let confidence = reply
        .get("confidence")
        .and_then(Value::as_f64)
        .or_else(|| raw_calls.iter().find_map(|c| c.confidence))
        .unwrap_or(0.0);
    let cloud_handoff = reply
        .get("cloud_handoff")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let calls = raw_calls
        .into_iter()
        .filter_map(|raw| {
            let name = raw.tool_name?.trim().to_string();
            if name.is_empty() {
                return None;
            }
            let arguments = match raw.tool_args {
                Value::Object(map) => map,
                _ => ArgMap::new(),
            };
            Some(ModelCall { name, arguments })
        })
        .collect();

    Ok(ModelOutput {
        calls,
        confidence: confidence.clamp(0.0, 1.0),
        cloud_handoff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::mock::MockLocalModel;
    use crate::registry::ToolRegistry;
    use serde_json::json;

    // ── extract_json ─────────────────────────────────────────────

    #[test]
    fn extract_json_raw() {
        let input = r#"{"tool_name": "set_timer", "tool_args": {}, "confidence": 0.9}"#;
        assert_eq!(extract_json(input), input);
    }

    #[test]
    fn extract_json_markdown_json_block() {
        let input = "```json\n{\"tool_name\": \"set_alarm\"}\n```";
        assert_eq!(extract_json(input), "{\"tool_name\": \"set_alarm\"}");
    }

    #[test]
    fn extract_json_with_surrounding_text() {
        let input = "Sure:\n```\n{\"tool_name\": \"play_music\"}\n```\nDone.";
        assert_eq!(extract_json(input), "{\"tool_name\": \"play_music\"}");
    }

    // ── parse_model_output ───────────────────────────────────────

    #[test]
    fn parse_single_call() {
        let out = parse_model_output(
            r#"{"tool_name": "get_weather", "tool_args": {"location": "Denver"}, "confidence": 0.92}"#,
        )
        .unwrap();
        assert_eq!(out.calls.len(), 1);
        assert_eq!(out.calls[0].name, "get_weather");
        assert_eq!(out.calls[0].arguments["location"], "Denver");
        assert!((out.confidence - 0.92).abs() < f64::EPSILON);
        assert!(!out.cloud_handoff);
    }

    #[test]
    fn parse_null_tool_name() {
        let out = parse_model_output(r#"{"tool_name": null, "tool_args": {}, "confidence": 0.0}"#).unwrap();
        assert!(out.calls.is_empty());
    }

    #[test]
    fn parse_calls_array_and_arguments_alias() {
        let out = parse_model_output(
            r#"{"calls": [{"tool_name": "set_timer", "arguments": {"minutes": 5}},
                          {"tool_name": "play_music", "tool_args": {"genre": "jazz"}}],
                "confidence": 0.8}"#,
        )
        .unwrap();
        assert_eq!(out.calls.len(), 2);
        assert_eq!(out.calls[0].arguments["minutes"], 5);
        assert_eq!(out.calls[1].name, "play_music");
    }

    #[test]
    fn parse_handoff_flag() {
        let out = parse_model_output(r#"{"tool_name": null, "cloud_handoff": true}"#).unwrap();
        assert!(out.cloud_handoff);
        assert_eq!(out.confidence, 0.0);
    }

    #[test]
    fn parse_non_object_args_become_empty() {
        let out = parse_model_output(r#"{"tool_name": "set_alarm", "tool_args": "7am", "confidence": 1.5}"#).unwrap();
        assert!(out.calls[0].arguments.is_empty());
        assert_eq!(out.confidence, 1.0);
    }

    #[test]
    fn parse_garbage_is_error() {
        let err = parse_model_output("this is not json at all").unwrap_err();
        assert!(matches!(err, InferenceError::InvalidOutput(_)));
    }

    // ── system_prompt ────────────────────────────────────────────

    #[test]
    fn system_prompt_lists_every_offered_tool() {
        let reg = ToolRegistry::with_defaults();
        let prompt = system_prompt(reg.specs());
        for spec in reg.specs() {
            assert!(prompt.contains(&spec.name));
        }
        assert!(prompt.contains("\"tool_name\""));
    }

    // ── LocalModelHandle ─────────────────────────────────────────

    #[tokio::test]
    async fn handle_acquires_and_releases_each_call() {
        let model = Arc::new(MockLocalModel::always(ModelOutput::single(
            "set_timer",
            json!({"minutes": 5}),
            0.9,
        )));
        let handle = LocalModelHandle::new(model.clone());
        handle.infer("five minute timer", &[]).await.unwrap();
        handle.infer("five minute timer", &[]).await.unwrap();
        assert_eq!(model.acquires(), 2);
        assert_eq!(model.releases(), 2);
        assert_eq!(model.invocations(), 2);
    }

    #[tokio::test]
    async fn handle_releases_on_inference_error() {
        let model = Arc::new(MockLocalModel::failing("boom"));
        let handle = LocalModelHandle::new(model.clone());
        assert!(handle.infer("anything", &[]).await.is_err());
        assert_eq!(model.acquires(), 1);
        assert_eq!(model.releases(), 1);
    }

    #[tokio::test]
    async fn handle_releases_on_cancellation() {
        let model = Arc::new(
            MockLocalModel::always(ModelOutput::empty()).with_delay(std::time::Duration::from_secs(5)),
        );
        let handle = LocalModelHandle::new(model.clone());
        let cancelled =
            tokio::time::timeout(std::time::Duration::from_millis(20), handle.infer("slow", &[])).await;
        assert!(cancelled.is_err());

        // The spawned release still holds the lease; the next call waits for it.
        let model_fast = model.clone();
        model_fast.set_delay(None);
        handle.infer("fast", &[]).await.unwrap();
        assert_eq!(model.acquires(), 2);
        assert_eq!(model.releases(), 2);
    }
}
