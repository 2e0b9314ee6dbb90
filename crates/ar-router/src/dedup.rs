//! Duplicate call removal. First occurrence wins.

use ar_protocol::{RoutedCall, ValidatedCall};

/// Drop calls equal to an earlier one (same tool, same canonical args).
pub fn dedup(calls: Vec<ValidatedCall>) -> Vec<ValidatedCall> {
    let mut kept: Vec<ValidatedCall> = Vec::with_capacity(calls.len());
    for call in calls {
        if !kept.iter().any(|k| k.same_call(&call)) {
            kept.push(call);
        }
    }
    kept
}

/// [`dedup`] over routed entries. Unresolved entries are never merged.
///
/// Returns the kept entries and how many were removed.
pub fn dedup_routed(calls: Vec<RoutedCall>) -> (Vec<RoutedCall>, usize) {
    let before = calls.len();
    let mut kept: Vec<RoutedCall> = Vec::with_capacity(before);
    for call in calls {
        let duplicate = call.as_resolved().is_some_and(|c| {
            kept.iter()
                .filter_map(RoutedCall::as_resolved)
                .any(|k| k.same_call(c))
        });
        if !duplicate {
            kept.push(call);
        }
    }
    let removed = before - kept.len();
    (kept, removed)
}
