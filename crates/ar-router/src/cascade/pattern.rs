//! Pattern tier: deterministic per-tool extraction, confidence 1.0.

use ar_protocol::CallSource;
use async_trait::async_trait;

use super::{CandidateCall, ExtractionTier, SpanContext};
use crate::error::{RouteError, RouteResult};

pub struct PatternTier;

#[async_trait]
impl ExtractionTier for PatternTier {
    fn source(&self) -> CallSource {
        CallSource::Pattern
    }

    fn requires_tool(&self) -> bool {
        true
    }

    async fn attempt(&self, ctx: &SpanContext<'_>) -> RouteResult<CandidateCall> {
        let index = ctx.selected.ok_or(RouteError::NoToolSelected)?;
        let args = ctx.registry.tool(index).extract(&ctx.span.text);
        if args.is_empty() {
            return Err(RouteError::NoUsableCall {
                tier: CallSource::Pattern,
            });
        }
        Ok(CandidateCall {
            tool: ctx.registry.spec(index).clone(),
            args,
            confidence: 1.0,
            source: CallSource::Pattern,
        })
    }
}
