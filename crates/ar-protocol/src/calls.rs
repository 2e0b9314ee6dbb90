use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::ArgMap;

/// Which cascade tier produced a call's arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallSource {
    /// Deterministic per-tool text patterns.
    Pattern,
    /// On-device model.
    LocalModel,
    /// Network-hosted model.
    Cloud,
}

impl CallSource {
    pub fn is_on_device(self) -> bool {
        !matches!(self, Self::Cloud)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::LocalModel => "local_model",
            Self::Cloud => "cloud",
        }
    }
}

impl std::fmt::Display for CallSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A call that passed validation and normalization; args hold canonical values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedCall {
    pub tool: String,
    pub args: ArgMap,
    pub confidence: f64,
    pub source: CallSource,
    /// Ordinal of the intent span this call came from.
    pub span_index: usize,
}

impl ValidatedCall {
    /// Same tool and same canonical arguments.
    pub fn same_call(&self, other: &Self) -> bool {
        self.tool == other.tool && self.args == other.args
    }
}

/// A span every cascade tier failed on. The raw text is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedCall {
    pub span_index: usize,
    pub text: String,
    pub reason: String,
}

/// One entry of the routing output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoutedCall {
    Resolved(ValidatedCall),
    Unresolved(UnresolvedCall),
}

impl RoutedCall {
    /// Tool name, or `None` for unresolved entries.
    pub fn tool(&self) -> Option<&str> {
        match self {
            Self::Resolved(call) => Some(&call.tool),
            Self::Unresolved(_) => None,
        }
    }

    pub fn span_index(&self) -> usize {
        match self {
            Self::Resolved(call) => call.span_index,
            Self::Unresolved(u) => u.span_index,
        }
    }

    pub fn as_resolved(&self) -> Option<&ValidatedCall> {
        match self {
            Self::Resolved(call) => Some(call),
            Self::Unresolved(_) => None,
        }
    }
}

/// Per-request counters. Reporting only; they never influence routing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingStats {
    pub total_spans: u32,
    pub resolved_pattern: u32,
    pub resolved_local: u32,
    pub resolved_cloud: u32,
    pub unresolved: u32,
    pub duplicates_removed: u32,
    pub local_invocations: u32,
    pub cloud_invocations: u32,
}

impl RoutingStats {
    pub fn record_resolved(&mut self, source: CallSource) {
        match source {
            CallSource::Pattern => self.resolved_pattern += 1,
            CallSource::LocalModel => self.resolved_local += 1,
            CallSource::Cloud => self.resolved_cloud += 1,
        }
    }
}

/// Externally visible output of routing one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingResult {
    /// UUIDv7, time-sortable.
    pub request_id: Uuid,
    pub request: String,
    /// Calls in the left-to-right order of their originating spans.
    pub calls: Vec<RoutedCall>,
    pub total_latency_ms: u64,
    /// True when no resolved call needed the cloud tier.
    pub on_device: bool,
    pub stats: RoutingStats,
    pub routed_at: DateTime<Utc>,
}

impl RoutingResult {
    pub fn new(
        request: impl Into<String>,
        calls: Vec<RoutedCall>,
        stats: RoutingStats,
        total_latency_ms: u64,
    ) -> Self {
        let on_device = calls
            .iter()
            .filter_map(RoutedCall::as_resolved)
            .all(|c| c.source.is_on_device());
        Self {
            request_id: Uuid::now_v7(),
            request: request.into(),
            calls,
            total_latency_ms,
            on_device,
            stats,
            routed_at: Utc::now(),
        }
    }

    pub fn resolved(&self) -> impl Iterator<Item = &ValidatedCall> {
        self.calls.iter().filter_map(RoutedCall::as_resolved)
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &UnresolvedCall> {
        self.calls.iter().filter_map(|c| match c {
            RoutedCall::Unresolved(u) => Some(u),
            RoutedCall::Resolved(_) => None,
        })
    }

    /// Fraction of resolved calls that did not need the cloud tier.
    pub fn on_device_ratio(&self) -> f64 {
        let (total, local) = self.resolved().fold((0usize, 0usize), |(t, l), c| {
            (t + 1, l + usize::from(c.source.is_on_device()))
        });
        if total == 0 {
            1.0
        } else {
            local as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(tool: &str, args: serde_json::Value, source: CallSource, span: usize) -> ValidatedCall {
        ValidatedCall {
            tool: tool.into(),
            args: args.as_object().cloned().unwrap(),
            confidence: 1.0,
            source,
            span_index: span,
        }
    }

    #[test]
    fn call_source_serde() {
        assert_eq!(
            serde_json::to_string(&CallSource::LocalModel).unwrap(),
            "\"local_model\""
        );
        assert_eq!(CallSource::Cloud.to_string(), "cloud");
        assert!(CallSource::Pattern.is_on_device());
        assert!(!CallSource::Cloud.is_on_device());
    }

    #[test]
    fn same_call_ignores_key_order() {
        let a = call("set_alarm", json!({"hour": 7, "minute": 0}), CallSource::Pattern, 0);
        let b = call("set_alarm", json!({"minute": 0, "hour": 7}), CallSource::Cloud, 3);
        assert!(a.same_call(&b));
        let c = call("set_alarm", json!({"hour": 8, "minute": 0}), CallSource::Pattern, 0);
        assert!(!a.same_call(&c));
    }

    #[test]
    fn routed_call_tagged_serialization() {
        let resolved = RoutedCall::Resolved(call(
            "set_timer",
            json!({"minutes": 5}),
            CallSource::Pattern,
            0,
        ));
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["status"], "resolved");
        assert_eq!(json["tool"], "set_timer");

        let unresolved = RoutedCall::Unresolved(UnresolvedCall {
            span_index: 1,
            text: "do the thing".into(),
            reason: "cloud tier timed out".into(),
        });
        let json = serde_json::to_value(&unresolved).unwrap();
        assert_eq!(json["status"], "unresolved");
        assert_eq!(json["text"], "do the thing");
        assert_eq!(unresolved.tool(), None);
        assert_eq!(unresolved.span_index(), 1);
    }

    #[test]
    fn on_device_flag_and_ratio() {
        let calls = vec![
            RoutedCall::Resolved(call("set_timer", json!({"minutes": 5}), CallSource::Pattern, 0)),
            RoutedCall::Resolved(call("get_weather", json!({"location": "Paris"}), CallSource::Cloud, 1)),
        ];
        let result = RoutingResult::new("req", calls, RoutingStats::default(), 12);
        assert!(!result.on_device);
        assert!((result.on_device_ratio() - 0.5).abs() < f64::EPSILON);
        assert_eq!(result.resolved().count(), 2);
        assert_eq!(result.unresolved().count(), 0);
    }

    #[test]
    fn empty_result_is_on_device() {
        let result = RoutingResult::new("", vec![], RoutingStats::default(), 0);
        assert!(result.on_device);
        assert_eq!(result.on_device_ratio(), 1.0);
    }

    #[test]
    fn stats_record_by_source() {
        let mut stats = RoutingStats::default();
        stats.record_resolved(CallSource::Pattern);
        stats.record_resolved(CallSource::Pattern);
        stats.record_resolved(CallSource::Cloud);
        assert_eq!(stats.resolved_pattern, 2);
        assert_eq!(stats.resolved_local, 0);
        assert_eq!(stats.resolved_cloud, 1);
    }
}
