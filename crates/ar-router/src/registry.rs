//! Tool registry: the process-wide, read-only set of routable tools.
//!
//! Tools are kept in declaration order. That order is the tie-break
//! whenever two tools score equally for a span.

use std::collections::HashMap;
use std::sync::Arc;

use ar_protocol::ToolSpec;
use serde::Serialize;

use crate::tools::{self, Tool};

/// Metadata about a registered tool (used by the tool listing API).
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub schema: serde_json::Value,
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    specs: Vec<Arc<ToolSpec>>,
    /// Map from tool name → index into `tools`/`specs`.
    index: HashMap<String, usize>,
    /// Union of all action cues, longest first.
    cues: Vec<&'static str>,
}

impl ToolRegistry {
    /// Build a registry from a tool collection. Later duplicates of a
    /// name are ignored.
    pub fn new(candidates: Vec<Box<dyn Tool>>) -> Self {
        let mut tools = Vec::with_capacity(candidates.len());
        let mut specs = Vec::with_capacity(candidates.len());
        let mut index = HashMap::new();

        for tool in candidates {
            let spec = tool.spec();
            if index.contains_key(&spec.name) {
                tracing::warn!(tool = %spec.name, "duplicate tool name ignored");
                continue;
            }
            index.insert(spec.name.clone(), tools.len());
            specs.push(Arc::new(spec));
            tools.push(tool);
        }

        let mut cues: Vec<&'static str> = tools.iter().flat_map(|t| t.cues().iter().copied()).collect();
        cues.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        cues.dedup();

        Self {
            tools,
            specs,
            index,
            cues,
        }
    }

    /// Build with the built-in tool set.
    pub fn with_defaults() -> Self {
        Self::new(tools::all_tools())
    }

    /// Look up a tool index by name.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn tool(&self, index: usize) -> &dyn Tool {
        self.tools[index].as_ref()
    }

    pub fn spec(&self, index: usize) -> &Arc<ToolSpec> {
        &self.specs[index]
    }

    /// All specs in declaration order.
    pub fn specs(&self) -> &[Arc<ToolSpec>] {
        &self.specs
    }

    /// Action cues across all tools, longest first.
    pub fn action_cues(&self) -> &[&'static str] {
        &self.cues
    }

    /// List all registered tools with metadata.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.specs
            .iter()
            .map(|spec| ToolInfo {
                name: spec.name.clone(),
                description: spec.description.clone(),
                schema: spec.to_json_schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{SetAlarm, SetTimer};

    #[test]
    fn registry_with_defaults() {
        let reg = ToolRegistry::with_defaults();
        assert_eq!(reg.len(), 7);
        assert!(!reg.is_empty());
    }

    #[test]
    fn declaration_order_is_preserved() {
        let reg = ToolRegistry::with_defaults();
        let names: Vec<&str> = reg.specs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "set_alarm",
                "set_timer",
                "create_reminder",
                "play_music",
                "send_message",
                "search_contacts",
                "get_weather",
            ]
        );
    }

    #[test]
    fn lookup_by_name() {
        let reg = ToolRegistry::with_defaults();
        let idx = reg.lookup("get_weather").unwrap();
        assert_eq!(reg.spec(idx).name, "get_weather");
        assert_eq!(reg.tool(idx).spec().name, "get_weather");
        assert!(reg.lookup("read_dtcs").is_none());
    }

    #[test]
    fn duplicate_names_ignored() {
        let reg = ToolRegistry::new(vec![Box::new(SetAlarm), Box::new(SetTimer), Box::new(SetAlarm)]);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.lookup("set_timer"), Some(1));
    }

    #[test]
    fn cues_longest_first_and_unique() {
        let reg = ToolRegistry::with_defaults();
        let cues = reg.action_cues();
        assert!(cues.windows(2).all(|w| w[0].len() >= w[1].len()));
        assert_eq!(cues.iter().filter(|c| **c == "set").count(), 1);
        assert!(cues.contains(&"look up"));
    }

    #[test]
    fn list_tools_has_schemas() {
        let reg = ToolRegistry::with_defaults();
        let tools = reg.list_tools();
        assert_eq!(tools.len(), 7);
        let alarm = &tools[0];
        assert_eq!(alarm.name, "set_alarm");
        assert_eq!(alarm.schema["required"], serde_json::json!(["hour"]));
    }
}
