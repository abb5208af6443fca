//! Core data model for per-frame detections and tracked cells

use serde::{Deserialize, Serialize};

/// A raw per-frame detection, before identity assignment.
///
/// Coordinates are percentages of frame width/height in [0, 100]; the
/// radius is a percentage of frame width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    /// Phenotype label from the vision service ("Normal" when unreported)
    pub status: String,
}

/// Kind of a per-frame biological event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Mitosis,
    Apoptosis,
    Interaction,
    Growth,
    Observation,
}

impl EventKind {
    /// Convert to string for logging/serialization keys
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Mitosis => "mitosis",
            EventKind::Apoptosis => "apoptosis",
            EventKind::Interaction => "interaction",
            EventKind::Growth => "growth",
            EventKind::Observation => "observation",
        }
    }
}

/// A classified event within one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameEvent {
    pub kind: EventKind,
    pub description: String,
}

/// A cell with stable identity and bounded motion history.
///
/// `id` is assigned at first observation and never reused. `history`
/// holds up to `TrackerConfig::history_len` past (x, y) points,
/// oldest-first, excluding the current position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedCell {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub status: String,
    pub history: Vec<(f64, f64)>,
}

/// One fully-tracked frame.
///
/// `cell_count` is the vision service's own count estimate and is not
/// reconciled against `cells.len()`; upstream counts are noisy and both
/// numbers are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameResult {
    pub timestamp: f64,
    pub cell_count: u32,
    pub cells: Vec<TrackedCell>,
    pub events: Vec<FrameEvent>,
}
