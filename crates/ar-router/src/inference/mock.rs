//! Mock models for testing without Ollama or Bedrock.
//!
//! Responses are scripted; every call is recorded for assertion in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ar_protocol::ToolSpec;
use async_trait::async_trait;

use super::{CloudModel, InferenceError, LocalModel, ModelOutput};

type Reply = Result<ModelOutput, InferenceError>;

/// A recorded `infer` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    /// Names of the tools offered to the model.
    pub tools: Vec<String>,
}

/// Scripted replies plus a fallback once the script runs out.
struct Script {
    queue: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Script {
    fn new(queue: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            queue: Mutex::new(queue.into()),
            fallback,
            delay: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    async fn next(&self, prompt: &str, tools: &[Arc<ToolSpec>]) -> Reply {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            tools: tools.iter().map(|t| t.name.clone()).collect(),
        });
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.queue.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }
}

// ── Local ───────────────────────────────────────────────────────

/// Mock on-device model. Tracks acquire/release pairs.
pub struct MockLocalModel {
    script: Script,
    acquires: AtomicUsize,
    releases: AtomicUsize,
}

impl MockLocalModel {
    /// Replies from `queue` in order, then `fallback` forever.
    pub fn scripted(queue: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            script: Script::new(queue, fallback),
            acquires: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        }
    }

    pub fn new() -> Self {
        Self::always(ModelOutput::empty())
    }

    pub fn always(output: ModelOutput) -> Self {
        Self::scripted(Vec::new(), Ok(output))
    }

    pub fn failing(message: &str) -> Self {
        Self::scripted(Vec::new(), Err(InferenceError::Unavailable(message.to_string())))
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_delay(Some(delay));
        self
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.script.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script.calls.lock().unwrap().clone()
    }

    pub fn invocations(&self) -> usize {
        self.script.calls.lock().unwrap().len()
    }

    pub fn acquires(&self) -> usize {
        self.acquires.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl Default for MockLocalModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalModel for MockLocalModel {
    fn name(&self) -> &str {
        "mock-local"
    }

    async fn acquire(&self) -> Result<(), InferenceError> {
        self.acquires.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn infer(&self, prompt: &str, tools: &[Arc<ToolSpec>]) -> Result<ModelOutput, InferenceError> {
        self.script.next(prompt, tools).await
    }

    async fn release(&self) -> Result<(), InferenceError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Cloud ───────────────────────────────────────────────────────

/// Mock cloud model.
pub struct MockCloudModel {
    script: Script,
}

impl MockCloudModel {
    pub fn scripted(queue: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            script: Script::new(queue, fallback),
        }
    }

    pub fn new() -> Self {
        Self::always(ModelOutput::empty())
    }

    pub fn always(output: ModelOutput) -> Self {
        Self::scripted(Vec::new(), Ok(output))
    }

    pub fn failing(message: &str) -> Self {
        Self::scripted(Vec::new(), Err(InferenceError::Unavailable(message.to_string())))
    }

    /// Every call sleeps for `delay` first; use it to force timeouts.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.script.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script.calls.lock().unwrap().clone()
    }

    pub fn invocations(&self) -> usize {
        self.script.calls.lock().unwrap().len()
    }
}

impl Default for MockCloudModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudModel for MockCloudModel {
    fn name(&self) -> &str {
        "mock-cloud"
    }

    async fn infer(&self, prompt: &str, tools: &[Arc<ToolSpec>]) -> Result<ModelOutput, InferenceError> {
        self.script.next(prompt, tools).await
    }
}
