//! Local-model tier: the span plus the selected tool's schema.

use std::slice;
use std::sync::Arc;

use ar_protocol::CallSource;
use async_trait::async_trait;

use super::{CandidateCall, ExtractionTier, SpanContext};
use crate::error::{RouteError, RouteResult};
use crate::inference::LocalModelHandle;

pub struct LocalTier {
    handle: Arc<LocalModelHandle>,
    min_confidence: f64,
}

impl LocalTier {
    pub fn new(handle: Arc<LocalModelHandle>, min_confidence: f64) -> Self {
        Self {
            handle,
            min_confidence,
        }
    }
}

/// Span text, plus the arguments still needed when escalation is targeted.
pub(crate) fn focused_prompt(text: &str, failing: &[String]) -> String {
    if failing.is_empty() {
        text.to_string()
    } else {
        format!("{text}\n\nOnly these arguments are needed: {}", failing.join(", "))
    }
}

#[async_trait]
impl ExtractionTier for LocalTier {
    fn source(&self) -> CallSource {
        CallSource::LocalModel
    }

    fn requires_tool(&self) -> bool {
        true
    }

    async fn attempt(&self, ctx: &SpanContext<'_>) -> RouteResult<CandidateCall> {
        let spec = ctx.selected_spec().ok_or(RouteError::NoToolSelected)?;
        let prompt = focused_prompt(&ctx.span.text, ctx.failing);

        let out = self.handle.infer(&prompt, slice::from_ref(spec)).await?;

        if out.cloud_handoff {
            tracing::debug!(span = ctx.span.index, "local model requested cloud handoff");
            return Err(RouteError::NoUsableCall {
                tier: CallSource::LocalModel,
            });
        }
        if out.confidence < self.min_confidence {
            return Err(RouteError::ExtractionLowConfidence {
                tier: CallSource::LocalModel,
                confidence: out.confidence,
            });
        }

        let call = out
            .calls
            .into_iter()
            .find(|c| c.name == spec.name)
            .ok_or(RouteError::NoUsableCall {
                tier: CallSource::LocalModel,
            })?;

        Ok(CandidateCall {
            tool: Arc::clone(spec),
            args: call.arguments,
            confidence: out.confidence,
            source: CallSource::LocalModel,
        })
    }
}
