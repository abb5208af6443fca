//! Cross-Frame Cell Tracker
//!
//! ## Responsibilities
//!
//! - Link per-frame detections into persistent identities
//! - Maintain bounded per-cell motion history
//! - Synthesize population-growth events between frames
//!
//! Tracking is greedy nearest-neighbor over the previous frame only:
//! each detection independently picks the closest previous cell within
//! the link threshold. A previous cell is not removed from candidacy
//! once matched, so two detections can claim the same identity in rare
//! crossings. Frames must be fed strictly in timestamp order.

pub mod types;

use crate::config::TrackerConfig;
pub use types::{Detection, EventKind, FrameEvent, FrameResult, TrackedCell};

/// Stateful cross-frame linker.
///
/// Carries the id counter and the fully-resolved previous frame across
/// the whole run. Pure computation, no I/O.
pub struct CellTracker {
    config: TrackerConfig,
    /// Next identity to mint; starts at 1, never reused
    next_id: u64,
    /// Fully-resolved cells of the previous frame
    prev: Vec<TrackedCell>,
    /// Frames processed so far
    frames_seen: u64,
}

impl CellTracker {
    /// Create a tracker with the given parameters
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            next_id: 1,
            prev: Vec::new(),
            frames_seen: 0,
        }
    }

    /// Distinct identities minted so far
    pub fn ids_minted(&self) -> u64 {
        self.next_id - 1
    }

    /// Link one frame's detections against the previous frame.
    ///
    /// Detections are processed in arrival order; order breaks distance
    /// ties. `events` are the inference-sourced events for this frame; a
    /// Growth event may be appended to them. Coordinates must be finite;
    /// the inference normalizer guarantees this.
    pub fn advance(
        &mut self,
        timestamp: f64,
        cell_count: u32,
        detections: &[Detection],
        mut events: Vec<FrameEvent>,
    ) -> FrameResult {
        let prev_count = self.prev.len();
        let mut cells = Vec::with_capacity(detections.len());
        let mut minted = 0u32;

        for det in detections {
            debug_assert!(
                det.x.is_finite() && det.y.is_finite() && det.r.is_finite(),
                "tracker fed non-finite coordinates"
            );

            // Strictly-closer wins; on exact ties the earlier previous
            // cell keeps the match.
            let mut nearest: Option<(&TrackedCell, f64)> = None;
            for p in &self.prev {
                let d = ((det.x - p.x).powi(2) + (det.y - p.y).powi(2)).sqrt();
                if d < self.config.link_threshold
                    && nearest.map_or(true, |(_, best)| d < best)
                {
                    nearest = Some((p, d));
                }
            }

            let cell = match nearest {
                Some((matched, _)) => {
                    let mut history = matched.history.clone();
                    history.push((matched.x, matched.y));
                    if history.len() > self.config.history_len {
                        let excess = history.len() - self.config.history_len;
                        history.drain(..excess);
                    }
                    TrackedCell {
                        id: matched.id,
                        x: det.x,
                        y: det.y,
                        r: det.r,
                        status: det.status.clone(),
                        history,
                    }
                }
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    minted += 1;
                    TrackedCell {
                        id,
                        x: det.x,
                        y: det.y,
                        r: det.r,
                        status: det.status.clone(),
                        history: Vec::new(),
                    }
                }
            };

            cells.push(cell);
        }

        // Population growth heuristic: fresh identities plus a higher
        // detection count, unless inference already reported a division.
        // New cells entering at the frame edge are indistinguishable here.
        if self.frames_seen > 0
            && minted > 0
            && detections.len() > prev_count
            && !events.iter().any(|e| e.kind == EventKind::Mitosis)
        {
            events.push(FrameEvent {
                kind: EventKind::Growth,
                description: format!("Cell population increased to {}", detections.len()),
            });
            tracing::debug!(
                timestamp = timestamp,
                new_ids = minted,
                population = detections.len(),
                "Growth event synthesized"
            );
        }

        self.prev = cells.clone();
        self.frames_seen += 1;

        FrameResult {
            timestamp,
            cell_count,
            cells,
            events,
        }
    }
}
