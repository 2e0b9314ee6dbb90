//! search_contacts: look a person up in the address book.

use std::sync::LazyLock;

use ar_protocol::{ArgMap, ArgSpec, ToolSpec, ValueHint};
use regex::Regex;
use serde_json::json;

use super::{Tool, compile};
use crate::coerce::clean_text;

static TRIGGERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\b(?:find|look\s*up|search\s+for)\s+\w+\s+in\s+(?:my\s+)?contacts?\b",
        r"\bcontacts?\b",
        r"\blook\s*up\b",
        r"\bfind\b",
        r"\bsearch\b",
    ])
});

// "find Tom in my contacts", "look up Sarah Lee in contacts"
static IN_CONTACTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:find|look\s*up|search\s+for|search)\s+([A-Za-z][\w'-]*(?:\s+[A-Z][\w'-]*)?)\s+(?:in|from|on)\s+(?:my\s+)?(?:contacts?|address\s+book|phone)",
    )
    .unwrap()
});

// "search my contacts for Dave"
static CONTACTS_FOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsearch\s+(?:my\s+|the\s+)?contacts?\s+for\s+(.+)$").unwrap()
});

// "find Jake's number", "look up Mia"
static BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:find|look\s*up)\s+(?:contact\s+)?([A-Za-z][\w-]*)(?:'s\s+(?:number|contact|details|phone(?:\s+number)?))?[.!?]*$",
    )
    .unwrap()
});

pub struct SearchContacts;

impl Tool for SearchContacts {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("search_contacts", "Search for a contact by name").with_arg(
            ArgSpec::string("query", "Name to search for")
                .required()
                .hint(ValueHint::Contact),
        )
    }

    fn triggers(&self) -> &[Regex] {
        &TRIGGERS
    }

    fn cues(&self) -> &'static [&'static str] {
        &["find", "look up", "look", "search"]
    }

    fn extract(&self, text: &str) -> ArgMap {
        let mut args = ArgMap::new();
        let query = [&*IN_CONTACTS, &*CONTACTS_FOR, &*BARE]
            .into_iter()
            .find_map(|re| re.captures(text))
            .map(|caps| clean_text(&caps[1]))
            .filter(|q| !q.is_empty() && !q.eq_ignore_ascii_case("my"));
        if let Some(query) = query {
            args.insert("query".into(), json!(query));
        }
        args
    }
}
