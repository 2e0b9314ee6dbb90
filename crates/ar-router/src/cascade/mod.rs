//! Argument extraction cascade.
//!
//! The cascade is an ordered list of tiers sharing one `attempt` contract.
//! The controller walks the list and escalates on failure, so reordering
//! or removing a tier is a configuration change.

pub mod cloud;
pub mod local;
pub mod pattern;

use std::sync::Arc;
use std::time::Duration;

use ar_protocol::{ArgMap, CallSource, IntentSpan, ToolSpec};
use async_trait::async_trait;

use crate::config::RoutingConfig;
use crate::error::RouteResult;
use crate::inference::{CloudModel, LocalModelHandle};
use crate::registry::ToolRegistry;

pub use cloud::CloudTier;
pub use local::LocalTier;
pub use pattern::PatternTier;

/// A proposed call from one tier. Superseded, never mutated, on escalation.
#[derive(Debug, Clone)]
pub struct CandidateCall {
    pub tool: Arc<ToolSpec>,
    pub args: ArgMap,
    pub confidence: f64,
    pub source: CallSource,
}

impl CandidateCall {
    /// Fill this call's gaps from an earlier attempt on the same tool.
    ///
    /// Arguments `earlier` already had are kept; this call contributes
    /// only the rest. Calls for a different tool are returned unchanged.
    pub fn backfilled_from(mut self, earlier: &CandidateCall) -> Self {
        if earlier.tool.name != self.tool.name {
            return self;
        }
        for (key, value) in &earlier.args {
            self.args.insert(key.clone(), value.clone());
        }
        self
    }

    /// Copy of this call without the named arguments.
    pub fn without(&self, names: &[String]) -> Self {
        let mut kept = self.clone();
        kept.args.retain(|k, _| !names.contains(k));
        kept
    }
}

/// Everything a tier may look at for one span.
pub struct SpanContext<'a> {
    /// The full original request.
    pub request: &'a str,
    pub span: &'a IntentSpan,
    /// Registry index of the selected tool.
    pub selected: Option<usize>,
    pub registry: &'a ToolRegistry,
    /// Arguments that still need a value, when escalation is targeted.
    pub failing: &'a [String],
}

impl SpanContext<'_> {
    pub fn selected_spec(&self) -> Option<&Arc<ToolSpec>> {
        self.selected.map(|i| self.registry.spec(i))
    }
}

#[async_trait]
pub trait ExtractionTier: Send + Sync {
    fn source(&self) -> CallSource;

    /// Tiers that only work on an already-selected tool.
    fn requires_tool(&self) -> bool;

    async fn attempt(&self, ctx: &SpanContext<'_>) -> RouteResult<CandidateCall>;
}

/// Build the cascade in configured order. Model tiers without a model
/// behind them are left out.
pub fn build_tiers(
    config: &RoutingConfig,
    local: Option<Arc<LocalModelHandle>>,
    cloud: Option<(Arc<dyn CloudModel>, Duration)>,
) -> Vec<Box<dyn ExtractionTier>> {
    let mut tiers: Vec<Box<dyn ExtractionTier>> = Vec::new();
    for source in &config.tiers {
        match source {
            CallSource::Pattern => tiers.push(Box::new(PatternTier)),
            CallSource::LocalModel => match &local {
                Some(handle) => tiers.push(Box::new(LocalTier::new(
                    Arc::clone(handle),
                    config.min_model_confidence,
                ))),
                None => tracing::info!("local model tier configured but no model available"),
            },
            CallSource::Cloud => match &cloud {
                Some((model, timeout)) => tiers.push(Box::new(CloudTier::new(
                    Arc::clone(model),
                    *timeout,
                    config.min_model_confidence,
                ))),
                None => tracing::info!("cloud tier configured but no model available"),
            },
        }
    }
    tiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::mock::{MockCloudModel, MockLocalModel};
    use serde_json::json;

    fn candidate(tool: &str, args: serde_json::Value, source: CallSource) -> CandidateCall {
        CandidateCall {
            tool: Arc::new(ToolSpec::new(tool, "")),
            args: args.as_object().cloned().unwrap(),
            confidence: 1.0,
            source,
        }
    }

    #[test]
    fn backfill_keeps_earlier_args() {
        let earlier = candidate("create_reminder", json!({"text": "call mom"}), CallSource::Pattern);
        let later = candidate(
            "create_reminder",
            json!({"text": "Call Mom!", "hour": 15}),
            CallSource::LocalModel,
        );
        let merged = later.backfilled_from(&earlier);
        assert_eq!(merged.args["text"], "call mom");
        assert_eq!(merged.args["hour"], 15);
        assert_eq!(merged.source, CallSource::LocalModel);
    }

    #[test]
    fn backfill_ignores_other_tool() {
        let earlier = candidate("set_alarm", json!({"hour": 7}), CallSource::Pattern);
        let later = candidate("set_timer", json!({"minutes": 5}), CallSource::Cloud);
        let merged = later.backfilled_from(&earlier);
        assert!(merged.args.get("hour").is_none());
    }

    #[test]
    fn without_drops_named_args() {
        let call = candidate("set_alarm", json!({"hour": 99, "minute": 0}), CallSource::Pattern);
        let kept = call.without(&["hour".to_string()]);
        assert!(kept.args.get("hour").is_none());
        assert_eq!(kept.args["minute"], 0);
    }

    #[test]
    fn build_tiers_follows_config_order() {
        let config = RoutingConfig {
            tiers: vec![CallSource::Cloud, CallSource::Pattern, CallSource::LocalModel],
            ..RoutingConfig::default()
        };
        let local = Arc::new(LocalModelHandle::new(Arc::new(MockLocalModel::new())));
        let cloud: Arc<dyn CloudModel> = Arc::new(MockCloudModel::new());
        let tiers = build_tiers(&config, Some(local), Some((cloud, Duration::from_secs(1))));
        let order: Vec<CallSource> = tiers.iter().map(|t| t.source()).collect();
        assert_eq!(order, vec![CallSource::Cloud, CallSource::Pattern, CallSource::LocalModel]);
    }

    #[test]
    fn build_tiers_skips_missing_models() {
        let tiers = build_tiers(&RoutingConfig::default(), None, None);
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers[0].source(), CallSource::Pattern);
        assert!(tiers[0].requires_tool());
    }
}
