//! Value coercion shared by the validator and the normalizer.

use ar_protocol::{ArgKind, ArgSpec, Constraint, ValueHint};
use serde_json::Value;

use crate::timeparse::{find_clock, find_duration_minutes, number_word};

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '`' | '“' | '”' | '‘' | '’')
}

/// Strip surrounding quotes/punctuation and collapse inner whitespace.
///
/// Trailing sentence punctuation is removed; model outputs often carry it.
pub fn clean_text(raw: &str) -> String {
    let trimmed = raw
        .trim_start_matches(|c: char| c.is_whitespace() || is_quote(c) || matches!(c, ',' | ';' | ':'))
        .trim_end_matches(|c: char| {
            c.is_whitespace() || is_quote(c) || matches!(c, '.' | '!' | '?' | ',' | ';' | ':')
        });
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `null` and blank strings count as absent.
pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => clean_text(s).is_empty(),
        Some(_) => false,
    }
}

fn integer_from_text(text: &str, hint: ValueHint) -> Option<i64> {
    let cleaned = clean_text(text);
    if let Ok(n) = cleaned.parse::<i64>() {
        return Some(n);
    }
    if let Ok(f) = cleaned.parse::<f64>()
        && f.is_finite()
    {
        return Some(f.trunc() as i64);
    }
    let parsed = match hint {
        ValueHint::ClockHour => find_clock(&cleaned).map(|t| t.hour),
        ValueHint::ClockMinute => find_clock(&cleaned).map(|t| t.minute),
        ValueHint::DurationMinutes => find_duration_minutes(&cleaned),
        _ => None,
    };
    parsed
        .or_else(|| number_word(&cleaned.to_lowercase()))
        .map(i64::from)
}

/// Coerce a raw value to the argument's declared type.
///
/// Returns `None` when the value cannot be read as that type. Constraints
/// are not checked here.
pub fn coerce(spec: &ArgSpec, raw: &Value) -> Option<Value> {
    match spec.kind {
        ArgKind::Integer => match raw {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .map(Value::from),
            Value::String(s) => integer_from_text(s, spec.hint).map(Value::from),
            _ => None,
        },
        ArgKind::String => match raw {
            Value::String(s) => {
                let cleaned = clean_text(s);
                (!cleaned.is_empty()).then_some(Value::String(cleaned))
            }
            Value::Number(n) => Some(Value::String(n.to_string())),
            _ => None,
        },
        ArgKind::Enum => {
            let text = match raw {
                Value::String(s) => clean_text(s).to_lowercase(),
                _ => return None,
            };
            if text.is_empty() {
                return None;
            }
            let canonical = match &spec.constraint {
                Some(Constraint::OneOf { values }) => values
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(&text))
                    .cloned()
                    .unwrap_or(text),
                _ => text,
            };
            Some(Value::String(canonical))
        }
    }
}
