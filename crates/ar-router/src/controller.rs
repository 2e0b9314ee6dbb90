//! Routing controller: runs the pipeline for one request.
//!
//! Per span: `Selecting → Extracting(tier) → Validating → Normalizing →
//! Done | Failed`. Spans run sequentially; later spans may resolve
//! pronouns against names established by earlier ones. Every per-span
//! error is absorbed here, so [`RoutingController::route`] always returns
//! a result.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use ar_protocol::{CallSource, IntentSpan, RoutedCall, RoutingResult, RoutingStats, UnresolvedCall};
use serde::Serialize;

use crate::cascade::{CandidateCall, ExtractionTier, SpanContext, build_tiers};
use crate::config::{RouterConfig, RoutingConfig};
use crate::dedup::dedup_routed;
use crate::error::RouteError;
use crate::inference::bedrock::BedrockEngine;
use crate::inference::ollama::OllamaClient;
use crate::inference::{CloudModel, LocalModel, LocalModelHandle};
use crate::normalizer::{Normalizer, ProperNouns};
use crate::registry::ToolRegistry;
use crate::segmenter::IntentSegmenter;
use crate::selector::ToolSelector;
use crate::validator::Validator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanState {
    Selecting,
    Extracting(CallSource),
    Validating,
    Normalizing,
    Done,
    Failed,
}

fn enter(span: &IntentSpan, state: SpanState) {
    tracing::debug!(span = span.index, state = ?state, "span state");
}

// ── Counters ────────────────────────────────────────────────────

/// Cumulative counters across requests. Reporting only.
#[derive(Debug, Default)]
pub struct RouterMetrics {
    requests: AtomicU64,
    spans: AtomicU64,
    resolved_pattern: AtomicU64,
    resolved_local: AtomicU64,
    resolved_cloud: AtomicU64,
    unresolved: AtomicU64,
    duplicates_removed: AtomicU64,
    local_invocations: AtomicU64,
    cloud_invocations: AtomicU64,
}

/// Point-in-time copy of [`RouterMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub spans: u64,
    pub resolved_pattern: u64,
    pub resolved_local: u64,
    pub resolved_cloud: u64,
    pub unresolved: u64,
    pub duplicates_removed: u64,
    pub local_invocations: u64,
    pub cloud_invocations: u64,
    pub on_device_ratio: f64,
}

impl RouterMetrics {
    fn record(&self, stats: &RoutingStats) {
        let add = |counter: &AtomicU64, n: u32| {
            counter.fetch_add(u64::from(n), Ordering::Relaxed);
        };
        self.requests.fetch_add(1, Ordering::Relaxed);
        add(&self.spans, stats.total_spans);
        add(&self.resolved_pattern, stats.resolved_pattern);
        add(&self.resolved_local, stats.resolved_local);
        add(&self.resolved_cloud, stats.resolved_cloud);
        add(&self.unresolved, stats.unresolved);
        add(&self.duplicates_removed, stats.duplicates_removed);
        add(&self.local_invocations, stats.local_invocations);
        add(&self.cloud_invocations, stats.cloud_invocations);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let get = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        let resolved_pattern = get(&self.resolved_pattern);
        let resolved_local = get(&self.resolved_local);
        let resolved_cloud = get(&self.resolved_cloud);
        let resolved = resolved_pattern + resolved_local + resolved_cloud;
        let on_device_ratio = if resolved == 0 {
            1.0
        } else {
            (resolved_pattern + resolved_local) as f64 / resolved as f64
        };
        MetricsSnapshot {
            requests: get(&self.requests),
            spans: get(&self.spans),
            resolved_pattern,
            resolved_local,
            resolved_cloud,
            unresolved: get(&self.unresolved),
            duplicates_removed: get(&self.duplicates_removed),
            local_invocations: get(&self.local_invocations),
            cloud_invocations: get(&self.cloud_invocations),
            on_device_ratio,
        }
    }
}

// ── Builder ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct RoutingControllerBuilder {
    registry: Option<Arc<ToolRegistry>>,
    config: RoutingConfig,
    local: Option<Arc<dyn LocalModel>>,
    cloud: Option<(Arc<dyn CloudModel>, Duration)>,
}

impl RoutingControllerBuilder {
    pub fn registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    pub fn config(mut self, config: RoutingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn local_model(mut self, model: Arc<dyn LocalModel>) -> Self {
        self.local = Some(model);
        self
    }

    pub fn cloud_model(mut self, model: Arc<dyn CloudModel>, timeout: Duration) -> Self {
        self.cloud = Some((model, timeout));
        self
    }

    pub fn build(self) -> anyhow::Result<RoutingController> {
        self.config.validate()?;
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ToolRegistry::with_defaults()));
        let local = self.local.map(|m| Arc::new(LocalModelHandle::new(m)));
        let tiers = build_tiers(&self.config, local.clone(), self.cloud);
        let validator = Validator;

        Ok(RoutingController {
            segmenter: IntentSegmenter::new(Arc::clone(&registry), self.config.min_span_chars),
            selector: ToolSelector::new(
                Arc::clone(&registry),
                local,
                self.config.min_keyword_score,
                self.config.min_model_confidence,
            ),
            registry,
            config: self.config,
            tiers,
            validator,
            normalizer: Normalizer::new(validator),
            metrics: RouterMetrics::default(),
        })
    }
}

// ── Controller ──────────────────────────────────────────────────

pub struct RoutingController {
    registry: Arc<ToolRegistry>,
    config: RoutingConfig,
    segmenter: IntentSegmenter,
    selector: ToolSelector,
    tiers: Vec<Box<dyn ExtractionTier>>,
    validator: Validator,
    normalizer: Normalizer,
    metrics: RouterMetrics,
}

impl RoutingController {
    pub fn builder() -> RoutingControllerBuilder {
        RoutingControllerBuilder::default()
    }

    /// Build from file config: Ollama and Bedrock tiers only when enabled.
    pub async fn from_config(config: &RouterConfig) -> anyhow::Result<Self> {
        let mut builder = Self::builder().config(config.routing.clone());

        if config.ollama.enabled {
            let client = OllamaClient::new(config.ollama.clone())?;
            tracing::info!(
                host = %config.ollama.host,
                model = %config.ollama.model,
                "local model tier enabled"
            );
            builder = builder.local_model(Arc::new(client));
        }

        if config.bedrock.enabled {
            let engine = BedrockEngine::from_env(config.bedrock.clone()).await;
            tracing::info!(model_id = %config.bedrock.model_id, "cloud tier enabled");
            builder = builder.cloud_model(Arc::new(engine), Duration::from_secs(config.bedrock.timeout_secs));
        }

        builder.build()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Route one request to an ordered list of calls.
    pub async fn route(&self, request: &str) -> RoutingResult {
        let started = Instant::now();
        let mut stats = RoutingStats::default();

        if request.trim().is_empty() {
            let result = RoutingResult::new(request, Vec::new(), stats, 0);
            self.metrics.record(&result.stats);
            return result;
        }

        let spans = self.segmenter.segment(request);
        stats.total_spans = spans.len() as u32;
        let mut nouns = ProperNouns::scan(request);

        let mut routed = Vec::with_capacity(spans.len());
        for span in &spans {
            routed.push(self.route_span(request, span, &mut nouns, &mut stats).await);
        }

        let (calls, removed) = dedup_routed(routed);
        stats.duplicates_removed = removed as u32;
        for call in &calls {
            match call {
                RoutedCall::Resolved(c) => stats.record_resolved(c.source),
                RoutedCall::Unresolved(_) => stats.unresolved += 1,
            }
        }

        let latency_ms = started.elapsed().as_millis() as u64;
        let result = RoutingResult::new(request, calls, stats, latency_ms);
        self.metrics.record(&result.stats);

        tracing::info!(
            request_id = %result.request_id,
            spans = stats.total_spans,
            resolved = stats.resolved_pattern + stats.resolved_local + stats.resolved_cloud,
            unresolved = stats.unresolved,
            on_device = result.on_device,
            latency_ms,
            "request routed"
        );
        result
    }

    async fn route_span(
        &self,
        request: &str,
        span: &IntentSpan,
        nouns: &mut ProperNouns,
        stats: &mut RoutingStats,
    ) -> RoutedCall {
        enter(span, SpanState::Selecting);
        let selection = self.selector.select(span).await;
        if selection.model_invoked {
            stats.local_invocations += 1;
        }
        let selected = selection.best();
        if let Some(index) = selected {
            tracing::debug!(
                span = span.index,
                tool = %self.registry.spec(index).name,
                confidence = selection.confidence,
                method = ?selection.method,
                "tool selected"
            );
        }

        let mut last_error: Option<RouteError> = None;
        let mut carried: Option<CandidateCall> = None;
        let mut failing: Vec<String> = Vec::new();

        for tier in &self.tiers {
            let source = tier.source();
            if tier.requires_tool() && selected.is_none() {
                tracing::debug!(span = span.index, tier = %source, "no tool selected, skipping tier");
                last_error.get_or_insert(RouteError::NoToolSelected);
                continue;
            }

            enter(span, SpanState::Extracting(source));
            match source {
                CallSource::LocalModel => stats.local_invocations += 1,
                CallSource::Cloud => stats.cloud_invocations += 1,
                CallSource::Pattern => {}
            }

            let ctx = SpanContext {
                request,
                span,
                selected,
                registry: &self.registry,
                failing: if self.config.targeted_escalation { failing.as_slice() } else { &[] },
            };
            let candidate = match tier.attempt(&ctx).await {
                Ok(candidate) => candidate,
                Err(e) => {
                    tracing::debug!(span = span.index, tier = %source, error = %e, "escalating");
                    last_error = Some(e);
                    continue;
                }
            };
            let candidate = match &carried {
                Some(earlier) if self.config.targeted_escalation => candidate.backfilled_from(earlier),
                _ => candidate,
            };

            enter(span, SpanState::Validating);
            let outcome = match self.validator.validate(&candidate) {
                Ok(()) => {
                    enter(span, SpanState::Normalizing);
                    self.normalizer.normalize(&candidate, span, nouns)
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(call) => {
                    enter(span, SpanState::Done);
                    tracing::debug!(
                        span = span.index,
                        tool = %call.tool,
                        tier = %call.source,
                        confidence = call.confidence,
                        "span resolved"
                    );
                    return RoutedCall::Resolved(call);
                }
                Err(e) => {
                    tracing::debug!(span = span.index, tier = %source, error = %e, "escalating");
                    failing = e.failing_args().map(<[String]>::to_vec).unwrap_or_default();
                    carried = Some(candidate.without(&failing));
                    last_error = Some(e);
                }
            }
        }

        enter(span, SpanState::Failed);
        let reason = last_error.map_or_else(|| "no extraction tier configured".to_string(), |e| e.to_string());
        let reason = RouteError::UnresolvedSpan(reason).to_string();
        tracing::debug!(span = span.index, reason = %reason, "span unresolved");
        RoutedCall::Unresolved(UnresolvedCall {
            span_index: span.index,
            text: span.text.clone(),
            reason,
        })
    }
}
