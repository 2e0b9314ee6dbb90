//! set_timer: countdown for a number of minutes.

use std::sync::LazyLock;

use ar_protocol::{ArgMap, ArgSpec, ToolSpec, ValueHint};
use regex::Regex;
use serde_json::json;

use super::{Tool, compile};
use crate::timeparse::find_duration_minutes;

static TRIGGERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\b(?:set|start)\s+(?:a\s+|the\s+)?(?:[\w-]+\s+){0,2}timer\b",
        r"\btimer\b",
        r"\bcountdown\b",
        r"\b\d+[\s-]*(?:minutes?|mins?)\b",
    ])
});

pub struct SetTimer;

impl Tool for SetTimer {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("set_timer", "Set a countdown timer").with_arg(
            ArgSpec::integer("minutes", "Number of minutes")
                .required()
                .range(1, 1440)
                .hint(ValueHint::DurationMinutes),
        )
    }

    fn triggers(&self) -> &[Regex] {
        &TRIGGERS
    }

    fn cues(&self) -> &'static [&'static str] {
        &["set", "start"]
    }

    fn extract(&self, text: &str) -> ArgMap {
        let mut args = ArgMap::new();
        if let Some(minutes) = find_duration_minutes(text) {
            args.insert("minutes".into(), json!(minutes));
        }
        args
    }
}
