use serde::{Deserialize, Serialize};

/// One atomic intent: a contiguous slice of the request text.
///
/// `start`/`end` are byte offsets into the original request and `index`
/// is the left-to-right ordinal. Spans are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentSpan {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl IntentSpan {
    pub fn new(index: usize, start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    /// A single span covering the whole request.
    pub fn whole(request: &str) -> Self {
        Self::new(0, 0, request.len(), request)
    }
}
