//! Argument normalization: canonical typed values for validated calls.
//!
//! Driven by each argument's [`ValueHint`], so no tool needs its own
//! branch here. Clock and duration arguments are re-read from the span
//! text first; model-proposed digits are only a fallback.

use std::sync::LazyLock;

use ar_protocol::{ArgMap, IntentSpan, ToolSpec, ValidatedCall, ValueHint};
use regex::Regex;
use serde_json::{Value, json};

use crate::cascade::CandidateCall;
use crate::coerce::{clean_text, coerce};
use crate::error::RouteResult;
use crate::timeparse::{find_clock, find_duration_minutes};
use crate::validator::Validator;

const PRONOUNS: &[&str] = &["him", "her", "them", "he", "she", "they", "you"];

/// Capitalized words that are not names.
const NOT_NAMES: &[&str] = &[
    "i", "a", "an", "the", "and", "then", "also", "plus", "please", "hey", "hi", "hello", "ok", "okay",
    "set", "wake", "start", "remind", "create", "add", "play", "put", "listen", "send", "text", "message",
    "tell", "find", "look", "search", "check", "get", "what", "what's", "how", "give", "can", "could",
    "would", "will", "me", "my", "it", "is", "in", "at", "for", "to", "on", "am", "pm", "monday",
    "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "today", "tomorrow", "tonight",
];

static CAPITALIZED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+(?:'[a-z]+)?\b").unwrap());

static GENRE_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:some\s+)?(.+?)\s+music$").unwrap());

/// Proper nouns known so far in one request, with their byte offsets.
///
/// Seeded from the request text; contact values resolved in earlier spans
/// are added as they are established.
#[derive(Debug, Default, Clone)]
pub struct ProperNouns {
    found: Vec<(usize, String)>,
}

impl ProperNouns {
    pub fn scan(request: &str) -> Self {
        let found = CAPITALIZED
            .find_iter(request)
            .filter(|m| !NOT_NAMES.contains(&m.as_str().to_lowercase().as_str()))
            .map(|m| (m.start(), m.as_str().to_string()))
            .collect();
        Self { found }
    }

    pub fn establish(&mut self, name: &str, offset: usize) {
        if self.found.iter().any(|(o, n)| *o == offset && n == name) {
            return;
        }
        self.found.push((offset, name.to_string()));
        self.found.sort_by_key(|(o, _)| *o);
    }

    /// The closest proper noun strictly before `offset`.
    pub fn nearest_before(&self, offset: usize) -> Option<&str> {
        self.found
            .iter()
            .filter(|(o, _)| *o < offset)
            .max_by_key(|(o, _)| *o)
            .map(|(_, n)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.found.len()
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }
}

fn is_pronoun(value: &str) -> bool {
    PRONOUNS.contains(&value.to_lowercase().as_str())
}

/// Request offset of `word` inside the span, or the span start.
fn offset_in_span(span: &IntentSpan, word: &str) -> usize {
    let lower = span.text.to_ascii_lowercase();
    let word = word.to_ascii_lowercase();
    lower
        .match_indices(&word)
        .find(|(pos, _)| {
            let before = lower[..*pos].chars().next_back().is_none_or(|c| !c.is_alphanumeric());
            let after = lower[pos + word.len()..].chars().next().is_none_or(|c| !c.is_alphanumeric());
            before && after
        })
        .map_or(span.start, |(pos, _)| span.start + pos)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Normalizer {
    validator: Validator,
}

impl Normalizer {
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }

    /// Canonicalize a candidate's arguments and promote it to a [`ValidatedCall`].
    ///
    /// Undeclared arguments are dropped. The result is re-validated, since
    /// canonical values may differ from what the validator saw.
    pub fn normalize(
        &self,
        candidate: &CandidateCall,
        span: &IntentSpan,
        nouns: &mut ProperNouns,
    ) -> RouteResult<ValidatedCall> {
        let spec = &candidate.tool;
        let mut args = ArgMap::new();

        for arg in &spec.args {
            if let Some(value) = candidate.args.get(&arg.name).and_then(|v| coerce(arg, v)) {
                args.insert(arg.name.clone(), value);
            }
        }

        self.apply_time(spec, span, &mut args);
        move_genre_phrases(spec, &mut args);
        resolve_contacts(spec, span, nouns, &mut args);

        self.validator.check(spec, &args)?;

        Ok(ValidatedCall {
            tool: spec.name.clone(),
            args,
            confidence: candidate.confidence,
            source: candidate.source,
            span_index: span.index,
        })
    }

    fn apply_time(&self, spec: &ToolSpec, span: &IntentSpan, args: &mut ArgMap) {
        let clock = find_clock(&span.text);
        let duration = find_duration_minutes(&span.text);
        let has_hour = spec
            .args
            .iter()
            .any(|a| a.hint == ValueHint::ClockHour && args.contains_key(&a.name));

        for arg in &spec.args {
            match arg.hint {
                ValueHint::ClockHour => {
                    if let Some(t) = clock {
                        args.insert(arg.name.clone(), json!(t.hour));
                    }
                }
                ValueHint::ClockMinute => {
                    if let Some(t) = clock {
                        args.insert(arg.name.clone(), json!(t.minute));
                    } else if has_hour && !args.contains_key(&arg.name) {
                        args.insert(arg.name.clone(), json!(0));
                    }
                }
                ValueHint::DurationMinutes => {
                    if let Some(minutes) = duration {
                        args.insert(arg.name.clone(), json!(minutes));
                    }
                }
                _ => {}
            }
        }
    }
}

/// "some jazz music" in a media-title argument is a genre, not a title.
fn move_genre_phrases(spec: &ToolSpec, args: &mut ArgMap) {
    if spec.arg("genre").is_none() || args.contains_key("genre") {
        return;
    }
    let titles: Vec<String> = spec
        .args
        .iter()
        .filter(|a| a.hint == ValueHint::MediaTitle)
        .map(|a| a.name.clone())
        .collect();
    for name in titles {
        let Some(Value::String(title)) = args.get(&name) else {
            continue;
        };
        let Some(genre) = GENRE_PHRASE.captures(title).map(|c| c[1].to_lowercase()) else {
            continue;
        };
        args.remove(&name);
        args.insert("genre".into(), Value::String(genre));
        return;
    }
}

fn resolve_contacts(spec: &ToolSpec, span: &IntentSpan, nouns: &mut ProperNouns, args: &mut ArgMap) {
    for arg in spec.args.iter().filter(|a| a.hint == ValueHint::Contact) {
        let Some(Value::String(value)) = args.get(&arg.name).cloned() else {
            continue;
        };
        let value = clean_text(&value);
        if is_pronoun(&value) {
            let offset = offset_in_span(span, &value);
            match nouns.nearest_before(offset) {
                Some(name) => {
                    tracing::debug!(span = span.index, pronoun = %value, name, "pronoun resolved");
                    args.insert(arg.name.clone(), Value::String(name.to_string()));
                }
                None => continue,
            }
        }
        if let Some(Value::String(name)) = args.get(&arg.name) {
            let name = name.clone();
            nouns.establish(&name, span.start);
        }
    }
}
