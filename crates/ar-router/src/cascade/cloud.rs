//! Cloud tier: last resort, full request context, bounded by a timeout.

use std::sync::Arc;
use std::time::Duration;

use ar_protocol::CallSource;
use async_trait::async_trait;

use super::{CandidateCall, ExtractionTier, SpanContext};
use crate::error::{RouteError, RouteResult};
use crate::inference::CloudModel;

pub struct CloudTier {
    model: Arc<dyn CloudModel>,
    timeout: Duration,
    min_confidence: f64,
}

impl CloudTier {
    pub fn new(model: Arc<dyn CloudModel>, timeout: Duration, min_confidence: f64) -> Self {
        Self {
            model,
            timeout,
            min_confidence,
        }
    }

    fn prompt(ctx: &SpanContext<'_>) -> String {
        let mut prompt = format!(
            "Full request: \"{}\"\nResolve only this part of it: \"{}\"",
            ctx.request, ctx.span.text
        );
        if let Some(spec) = ctx.selected_spec() {
            prompt.push_str(&format!("\nLikely tool: {}", spec.name));
        }
        if !ctx.failing.is_empty() {
            prompt.push_str(&format!("\nOnly these arguments are needed: {}", ctx.failing.join(", ")));
        }
        prompt
    }
}

#[async_trait]
impl ExtractionTier for CloudTier {
    fn source(&self) -> CallSource {
        CallSource::Cloud
    }

    fn requires_tool(&self) -> bool {
        false
    }

    async fn attempt(&self, ctx: &SpanContext<'_>) -> RouteResult<CandidateCall> {
        let prompt = Self::prompt(ctx);
        let specs = ctx.registry.specs();

        let out = match tokio::time::timeout(self.timeout, self.model.infer(&prompt, specs)).await {
            Ok(Ok(out)) => out,
            Ok(Err(e)) => {
                tracing::warn!(model = self.model.name(), error = %e, "cloud model failed");
                return Err(RouteError::CloudUnavailable(e.to_string()));
            }
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                tracing::warn!(model = self.model.name(), timeout_ms, "cloud model timed out");
                return Err(RouteError::CloudTimeout { timeout_ms });
            }
        };

        if out.confidence < self.min_confidence {
            return Err(RouteError::ExtractionLowConfidence {
                tier: CallSource::Cloud,
                confidence: out.confidence,
            });
        }

        let preferred = ctx.selected_spec().map(|s| s.name.clone());
        let mut known: Vec<_> = out
            .calls
            .into_iter()
            .filter_map(|call| ctx.registry.lookup(&call.name).map(|i| (i, call)))
            .collect();
        let pick = known
            .iter()
            .position(|(_, call)| Some(&call.name) == preferred.as_ref())
            .unwrap_or(0);
        if known.is_empty() {
            return Err(RouteError::NoUsableCall {
                tier: CallSource::Cloud,
            });
        }
        let (index, call) = known.swap_remove(pick);

        Ok(CandidateCall {
            tool: Arc::clone(ctx.registry.spec(index)),
            args: call.arguments,
            confidence: out.confidence,
            source: CallSource::Cloud,
        })
    }
}
