//! Free-text event classification
//!
//! The vision service reports events as prose. Bucketing into a closed
//! kind set is a first-match scan over an ordered substring table, all
//! case-insensitive, with Observation as the fallback.

use crate::tracker::types::{EventKind, FrameEvent};

/// Ordered (substring, kind) rules; first match wins
const EVENT_RULES: &[(&str, EventKind)] = &[
    ("mitosis", EventKind::Mitosis),
    ("divid", EventKind::Mitosis),
    ("phase", EventKind::Mitosis),
    ("apoptosis", EventKind::Apoptosis),
    ("death", EventKind::Apoptosis),
    ("lysing", EventKind::Apoptosis),
    ("fusion", EventKind::Interaction),
    ("contact", EventKind::Interaction),
];

/// Classify one free-text event string into a `FrameEvent`
pub fn classify_event(text: &str) -> FrameEvent {
    let lower = text.to_lowercase();
    let kind = EVENT_RULES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, kind)| *kind)
        .unwrap_or(EventKind::Observation);

    FrameEvent {
        kind,
        description: text.to_string(),
    }
}
