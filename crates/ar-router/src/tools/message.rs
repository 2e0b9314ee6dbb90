//! send_message: a text message to a contact.

use std::sync::LazyLock;

use ar_protocol::{ArgMap, ArgSpec, ToolSpec, ValueHint};
use regex::Regex;
use serde_json::json;

use super::{Tool, compile};
use crate::coerce::clean_text;

static TRIGGERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\b(?:send|write)\s+(?:\w+\s+)?(?:a\s+)?(?:text|message|msg)\b",
        r"\btext\s+\w+",
        r"\bmessage\b",
        r"\bsaying\b",
        r"\btell\s+\w+\s+(?:that|to|i'm|i\s+am|i'll)\b",
    ])
});

// "send a message to Alice saying hello"
static TO_SAYING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:send|write)\s+(?:a\s+)?(?:text|message|msg)\s+to\s+([A-Za-z][\w'-]*)\s+(?:saying|that\s+says|that)\s+(.+)$",
    )
    .unwrap()
});

// "text Emma saying good night", "send him a message saying hi"
static DIRECT_SAYING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:text|message|send)\s+([A-Za-z][\w'-]*)\s+(?:(?:a\s+)?(?:text|message|msg)\s+)?(?:saying|that\s+says|that)\s+(.+)$",
    )
    .unwrap()
});

// "tell Bob that I'm coming"
static TELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btell\s+([A-Za-z][\w'-]*)\s+(?:that\s+)?(.+)$").unwrap());

// Recipient only: "send a message to Alice", "text Bob"
static RECIPIENT_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:(?:text|message|msg)\s+to|text|message)\s+([A-Za-z][\w'-]*)").unwrap()
});

const NOT_A_NAME: &[&str] = &["a", "an", "the", "me", "to", "my", "message", "text", "saying"];

fn name_ok(name: &str) -> bool {
    !NOT_A_NAME.contains(&name.to_lowercase().as_str())
}

pub struct SendMessage;

impl Tool for SendMessage {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("send_message", "Send a message to a contact")
            .with_arg(
                ArgSpec::string("recipient", "Name of the person to message")
                    .required()
                    .hint(ValueHint::Contact),
            )
            .with_arg(ArgSpec::string("message", "The message content").required())
    }

    fn triggers(&self) -> &[Regex] {
        &TRIGGERS
    }

    fn cues(&self) -> &'static [&'static str] {
        &["send", "text", "message", "tell"]
    }

    fn extract(&self, text: &str) -> ArgMap {
        let mut args = ArgMap::new();
        let full = [&*TO_SAYING, &*DIRECT_SAYING, &*TELL]
            .into_iter()
            .filter_map(|re| re.captures(text))
            .find(|caps| name_ok(&caps[1]));
        if let Some(caps) = full {
            args.insert("recipient".into(), json!(clean_text(&caps[1])));
            let body = clean_text(&caps[2]);
            if !body.is_empty() {
                args.insert("message".into(), json!(body));
            }
            return args;
        }
        if let Some(caps) = RECIPIENT_ONLY.captures(text)
            && name_ok(&caps[1])
        {
            args.insert("recipient".into(), json!(clean_text(&caps[1])));
        }
        args
    }
}
