//! Intent segmentation: split a request into atomic intent spans.
//!
//! A boundary is opened at a separator (comma, semicolon, "and", "then",
//! "also", "plus") only when the text after it starts with an action cue
//! and the span being closed already contains one. Pieces that no tool
//! recognizes are folded back into the preceding span.

use std::sync::{Arc, LazyLock};

use ar_protocol::IntentSpan;
use regex::Regex;

use crate::error::{RouteError, RouteResult};
use crate::registry::ToolRegistry;

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\s*[,;]\s*(?:(?:and\s+then|and|then|also|plus)\s+)?|\s+(?:and\s+then|and|then|also|plus)\s+)",
    )
    .unwrap()
});

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Longest cue that `text` starts with at a word boundary.
fn leading_cue<'a>(text: &str, cues: &[&'a str]) -> Option<&'a str> {
    cues.iter().copied().find(|cue| {
        text.starts_with(cue) && text[cue.len()..].chars().next().is_none_or(|c| !is_word_char(c))
    })
}

fn contains_cue(text: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| {
        text.match_indices(cue).any(|(pos, _)| {
            let before = text[..pos].chars().next_back().is_none_or(|c| !is_word_char(c));
            let after = text[pos + cue.len()..].chars().next().is_none_or(|c| !is_word_char(c));
            before && after
        })
    })
}

/// Shrink `[start, end)` past surrounding whitespace and trailing punctuation.
fn trim_bounds(request: &str, start: usize, end: usize) -> (usize, usize) {
    let piece = &request[start..end];
    let lead = piece.len() - piece.trim_start().len();
    let body = piece
        .trim_start()
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | ';' | '!' | '?'));
    (start + lead, start + lead + body.len())
}

pub struct IntentSegmenter {
    registry: Arc<ToolRegistry>,
    min_span_chars: usize,
}

impl IntentSegmenter {
    pub fn new(registry: Arc<ToolRegistry>, min_span_chars: usize) -> Self {
        Self {
            registry,
            min_span_chars,
        }
    }

    /// Split `request` into ordered spans. Always returns at least one.
    ///
    /// Ambiguous splits degrade to a single span covering the whole text.
    pub fn segment(&self, request: &str) -> Vec<IntentSpan> {
        match self.split(request) {
            Ok(spans) => spans,
            Err(e) => {
                tracing::debug!(error = %e, "falling back to single span");
                vec![IntentSpan::whole(request)]
            }
        }
    }

    /// Split without the single-span fallback.
    pub fn split(&self, request: &str) -> RouteResult<Vec<IntentSpan>> {
        // ASCII lowercasing keeps byte offsets aligned with `request`.
        let lower = request.to_ascii_lowercase();
        let cues = self.registry.action_cues();

        // Candidate pieces as (start, end) into `request`.
        let mut pieces: Vec<(usize, usize)> = Vec::new();
        let mut piece_start = 0;
        for sep in SEPARATOR.find_iter(&lower) {
            if leading_cue(&lower[sep.end()..], cues).is_none() {
                continue;
            }
            if !contains_cue(&lower[piece_start..sep.start()], cues) {
                continue;
            }
            pieces.push((piece_start, sep.start()));
            piece_start = sep.end();
        }
        pieces.push((piece_start, request.len()));

        if pieces.len() == 1 {
            return Ok(vec![IntentSpan::whole(request)]);
        }

        // A cue that opens nothing any tool recognizes is part of the previous
        // span's argument phrase ("saying get well soon").
        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(pieces.len());
        for (start, end) in pieces {
            let recognized = (0..self.registry.len())
                .any(|i| self.registry.tool(i).match_score(&request[start..end]) > 0.0);
            match merged.last_mut() {
                Some(prev) if !recognized => prev.1 = end,
                _ => merged.push((start, end)),
            }
        }

        if merged.len() == 1 {
            return Ok(vec![IntentSpan::whole(request)]);
        }

        let mut spans = Vec::with_capacity(merged.len());
        for (index, (start, end)) in merged.into_iter().enumerate() {
            let (start, end) = trim_bounds(request, start, end);
            let text = &request[start..end];
            if text.chars().count() < self.min_span_chars {
                return Err(RouteError::SegmentationAmbiguous(format!(
                    "fragment {text:?} at {start}..{end} is too short"
                )));
            }
            spans.push(IntentSpan::new(index, start, end, text));
        }

        tracing::debug!(spans = spans.len(), "request segmented");
        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> IntentSegmenter {
        IntentSegmenter::new(Arc::new(ToolRegistry::with_defaults()), 4)
    }

    fn texts(request: &str) -> Vec<String> {
        segmenter().segment(request).into_iter().map(|s| s.text).collect()
    }

    #[test]
    fn single_verb_is_whole_text() {
        let request = "Set an alarm for 10 AM.";
        let spans = segmenter().segment(request);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, request);
        assert_eq!((spans[0].start, spans[0].end), (0, request.len()));
    }

    #[test]
    fn no_verbs_is_whole_text() {
        let spans = segmenter().segment("hmm, not sure and whatever");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "hmm, not sure and whatever");
    }

    #[test]
    fn two_intents_joined_by_and() {
        assert_eq!(
            texts("set an alarm for 10am and remind me to call mom at 3pm"),
            vec!["set an alarm for 10am", "remind me to call mom at 3pm"]
        );
    }

    #[test]
    fn three_intents_with_commas() {
        assert_eq!(
            texts("Text Emma saying good night, check the weather in Chicago, and set an alarm for 5 AM"),
            vec![
                "Text Emma saying good night",
                "check the weather in Chicago",
                "set an alarm for 5 AM",
            ]
        );
    }

    #[test]
    fn conjunction_inside_message_does_not_split() {
        let request = "Send a message to Alice saying hello and goodbye";
        assert_eq!(texts(request), vec![request]);
    }

    #[test]
    fn offsets_and_indices_match_source() {
        let request = "Find Tom in my contacts and send him a message saying happy birthday";
        let spans = segmenter().segment(request);
        assert_eq!(spans.len(), 2);
        for (i, span) in spans.iter().enumerate() {
            assert_eq!(span.index, i);
            assert_eq!(&request[span.start..span.end], span.text);
        }
        assert_eq!(spans[1].text, "send him a message saying happy birthday");
    }

    #[test]
    fn unrecognized_cue_piece_folds_back() {
        let request = "text Bob saying hi, get well soon";
        assert_eq!(texts(request), vec![request]);
    }

    #[test]
    fn then_separator() {
        assert_eq!(
            texts("play some jazz music then set a timer for 20 minutes"),
            vec!["play some jazz music", "set a timer for 20 minutes"]
        );
    }

    #[test]
    fn short_fragment_is_ambiguous() {
        let seg = IntentSegmenter::new(Arc::new(ToolRegistry::with_defaults()), 40);
        let err = seg.split("set an alarm for 7am and play jazz").unwrap_err();
        assert!(matches!(err, RouteError::SegmentationAmbiguous(_)));
        let spans = seg.segment("set an alarm for 7am and play jazz");
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn leading_cue_respects_word_boundary() {
        let cues = ["set", "play"];
        assert_eq!(leading_cue("set a timer", &cues), Some("set"));
        assert_eq!(leading_cue("settle down", &cues), None);
        assert!(contains_cue("please play it", &cues));
        assert!(!contains_cue("display", &cues));
    }
}
