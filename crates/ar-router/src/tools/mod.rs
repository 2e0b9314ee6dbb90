//! Tool definitions: schema, trigger vocabulary and deterministic extraction.
//!
//! Each tool is a unit struct implementing [`Tool`]. The registry holds them
//! in declaration order, which is also the tie-break for equal scores.

pub mod alarm;
pub mod contacts;
pub mod message;
pub mod music;
pub mod reminder;
pub mod timer;
pub mod weather;

use ar_protocol::{ArgMap, ToolSpec};
use regex::Regex;

pub use alarm::SetAlarm;
pub use contacts::SearchContacts;
pub use message::SendMessage;
pub use music::PlayMusic;
pub use reminder::CreateReminder;
pub use timer::SetTimer;
pub use weather::GetWeather;

/// A routable tool.
pub trait Tool: Send + Sync {
    /// Argument contract. Built once by the registry.
    fn spec(&self) -> ToolSpec;

    /// Trigger patterns, matched against the lowercased span text.
    fn triggers(&self) -> &[Regex];

    /// Action verbs that open a new intent for this tool (lowercase).
    fn cues(&self) -> &'static [&'static str];

    /// Keyword score in `[0, 1]`; 0 means no trigger matched.
    fn match_score(&self, text: &str) -> f64 {
        keyword_score(&text.to_lowercase(), self.triggers())
    }

    /// Pattern-tier extraction. Returns whatever arguments the text yields,
    /// possibly none; the validator decides whether that is enough.
    fn extract(&self, text: &str) -> ArgMap;
}

/// Compile a list of trigger patterns. Patterns are constants.
pub(crate) fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

/// Best score over all trigger matches.
///
/// Position dominates: a match where the span opens outranks any later
/// match, whatever its length. Among matches at the same position the
/// longer one wins (saturating at 16 bytes). A single hit scores >= 0.4.
pub fn keyword_score(lower: &str, triggers: &[Regex]) -> f64 {
    if lower.is_empty() {
        return 0.0;
    }
    let len = lower.len() as f64;
    triggers
        .iter()
        .filter_map(|re| re.find(lower))
        .map(|m| {
            let position = 1.0 - m.start() as f64 / len;
            let length = m.len().min(16) as f64 / 16.0;
            0.4 + 0.45 * position + 0.15 * length
        })
        .fold(0.0, f64::max)
}

/// Strip a leading article ("the", "a", "an").
pub(crate) fn strip_article(text: &str) -> &str {
    let lower = text.to_ascii_lowercase();
    for article in ["the ", "a ", "an "] {
        if lower.starts_with(article) {
            return text[article.len()..].trim_start();
        }
    }
    text
}

/// All built-in tools, in registry declaration order.
pub fn all_tools() -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(SetAlarm),
        Box::new(SetTimer),
        Box::new(CreateReminder),
        Box::new(PlayMusic),
        Box::new(SendMessage),
        Box::new(SearchContacts),
        Box::new(GetWeather),
    ]
}
