//! set_alarm: wake-up alarm at a clock time.

use std::sync::LazyLock;

use ar_protocol::{ArgMap, ArgSpec, ToolSpec, ValueHint};
use regex::Regex;
use serde_json::json;

use super::{Tool, compile};
use crate::timeparse::find_clock;

static TRIGGERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\bset\s+(?:an\s+|my\s+|the\s+)?alarm\b",
        r"\bwake\s+me(?:\s+up)?\b",
        r"\balarm\b",
    ])
});

pub struct SetAlarm;

impl Tool for SetAlarm {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("set_alarm", "Set an alarm for a given time")
            .with_arg(
                ArgSpec::integer("hour", "Hour to set the alarm for (0-23)")
                    .required()
                    .range(0, 23)
                    .hint(ValueHint::ClockHour),
            )
            .with_arg(
                ArgSpec::integer("minute", "Minute to set the alarm for (0-59)")
                    .range(0, 59)
                    .hint(ValueHint::ClockMinute),
            )
    }

    fn triggers(&self) -> &[Regex] {
        &TRIGGERS
    }

    fn cues(&self) -> &'static [&'static str] {
        &["set", "wake"]
    }

    fn extract(&self, text: &str) -> ArgMap {
        let mut args = ArgMap::new();
        if let Some(t) = find_clock(text) {
            args.insert("hour".into(), json!(t.hour));
            args.insert("minute".into(), json!(t.minute));
        }
        args
    }
}
