//! create_reminder: a titled reminder at a clock time.

use std::sync::LazyLock;

use ar_protocol::{ArgMap, ArgSpec, ToolSpec, ValueHint};
use regex::Regex;
use serde_json::json;

use super::{Tool, compile, strip_article};
use crate::coerce::clean_text;
use crate::timeparse::find_clock;

static TRIGGERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\bremind\s+me\b",
        r"\b(?:create|add|set)\s+(?:a\s+)?reminder\b",
        r"\bremind\b",
        r"\breminder\b",
    ])
});

// "remind me to call mom at 3pm", "reminder about the meeting by 10am".
// Only a trailing clock phrase is cut from the text.
static TEXT_THEN_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:remind(?:\s+me)?|reminder)\s+(?:to|about|that|of)\s+(.+?)(?:\s+(?:at|by|around)\s+(?:\d{1,2}(?::\d{2})?\s*[ap]\.?m\.?|\d{1,2}:\d{2}|\d{1,2}(?:\s*o'?clock)?|noon|midday|midnight))?[\s.!?]*$",
    )
    .unwrap()
});

// "remind me at 3pm to call mom"
static TIME_THEN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bremind(?:\s+me)?\s+(?:at|by|around)\s+\S+(?:\s*[ap]\.?m\.?)?\s+(?:to|about|that|of)\s+(.+)$",
    )
    .unwrap()
});

pub struct CreateReminder;

impl Tool for CreateReminder {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("create_reminder", "Create a reminder at a given time")
            .with_arg(ArgSpec::string("text", "What to be reminded about").required())
            .with_arg(
                ArgSpec::integer("hour", "Hour of the reminder (0-23)")
                    .required()
                    .range(0, 23)
                    .hint(ValueHint::ClockHour),
            )
            .with_arg(
                ArgSpec::integer("minute", "Minute of the reminder (0-59)")
                    .range(0, 59)
                    .hint(ValueHint::ClockMinute),
            )
    }

    fn triggers(&self) -> &[Regex] {
        &TRIGGERS
    }

    fn cues(&self) -> &'static [&'static str] {
        &["remind", "create", "add"]
    }

    fn extract(&self, text: &str) -> ArgMap {
        let mut args = ArgMap::new();
        let title = TIME_THEN_TEXT
            .captures(text)
            .or_else(|| TEXT_THEN_TIME.captures(text))
            .map(|caps| clean_text(strip_article(caps[1].trim())))
            .filter(|t| !t.is_empty());
        if let Some(title) = title {
            args.insert("text".into(), json!(title));
        }
        if let Some(t) = find_clock(text) {
            args.insert("hour".into(), json!(t.hour));
            args.insert("minute".into(), json!(t.minute));
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_then_time() {
        let args = CreateReminder.extract("remind me to call mom at 3pm");
        assert_eq!(args["text"], "call mom");
        assert_eq!(args["hour"], 15);
        assert_eq!(args["minute"], 0);
    }

    #[test]
    fn time_then_text() {
        let args = CreateReminder.extract("Remind me at 7:30 am to take my pills");
        assert_eq!(args["text"], "take my pills");
        assert_eq!(args["hour"], 7);
        assert_eq!(args["minute"], 30);
    }

    #[test]
    fn article_is_stripped() {
        let args = CreateReminder.extract("remind me about the meeting at 2:00 PM");
        assert_eq!(args["text"], "meeting");
        assert_eq!(args["hour"], 14);
    }

    #[test]
    fn preposition_inside_text_is_kept() {
        let args = CreateReminder.extract("remind me to look at the stars at 9pm");
        assert_eq!(args["text"], "look at the stars");
        assert_eq!(args["hour"], 21);

        let args = CreateReminder.extract("remind me to stop by the bank around noon");
        assert_eq!(args["text"], "stop by the bank");
        assert_eq!(args["hour"], 12);
    }

    #[test]
    fn missing_time_keeps_text() {
        let args = CreateReminder.extract("remind me to buy milk");
        assert_eq!(args["text"], "buy milk");
        assert!(args.get("hour").is_none());
    }

    #[test]
    fn scores_above_embedded_verbs() {
        let text = "remind me to play piano";
        assert!(CreateReminder.match_score(text) > 0.6);
        assert!(CreateReminder.match_score(text) > crate::tools::PlayMusic.match_score(text));
    }
}
