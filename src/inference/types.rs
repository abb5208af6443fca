//! Wire schema for the vision inference service

use serde::{Deserialize, Serialize};

use super::classify::classify_event;
use crate::tracker::types::{Detection, FrameEvent};

/// Raw detection as the service reports it.
///
/// Every field is optional on the wire; a detection missing any of the
/// numeric fields is invalid and gets dropped without failing the frame.
#[derive(Debug, Clone, Deserialize)]
pub struct WireCell {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub r: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Response of `POST /v1/analyze`
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub cell_count: Option<u32>,
    #[serde(default)]
    pub cells: Vec<WireCell>,
    #[serde(default)]
    pub frame_events: Vec<String>,
}

/// Normalized result of analyzing one frame, ready for tracking
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameAnalysis {
    pub cell_count: u32,
    pub detections: Vec<Detection>,
    pub events: Vec<FrameEvent>,
}

impl FrameAnalysis {
    /// The explicit empty result a failed frame degrades to
    pub fn empty() -> Self {
        Self::default()
    }
}

impl From<AnalyzeResponse> for FrameAnalysis {
    fn from(resp: AnalyzeResponse) -> Self {
        let mut dropped = 0usize;
        let detections: Vec<Detection> = resp
            .cells
            .into_iter()
            .filter_map(|cell| match (cell.x, cell.y, cell.r) {
                (Some(x), Some(y), Some(r))
                    if x.is_finite() && y.is_finite() && r.is_finite() =>
                {
                    Some(Detection {
                        x,
                        y,
                        r,
                        status: cell.status.unwrap_or_else(|| "Normal".to_string()),
                    })
                }
                _ => {
                    dropped += 1;
                    None
                }
            })
            .collect();

        if dropped > 0 {
            tracing::warn!(dropped = dropped, "Dropped detections with invalid coordinates");
        }

        let events = resp
            .frame_events
            .iter()
            .map(|text| classify_event(text))
            .collect();

        Self {
            cell_count: resp.cell_count.unwrap_or(0),
            detections,
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::types::EventKind;

    #[test]
    fn test_invalid_detections_dropped_frame_survives() {
        let resp: AnalyzeResponse = serde_json::from_str(
            r#"{
                "cell_count": 3,
                "cells": [
                    {"x": 10.0, "y": 20.0, "r": 2.0},
                    {"x": 30.0, "y": 40.0},
                    {"y": 5.0, "r": 1.0, "status": "Apoptotic"},
                    {"x": 55.0, "y": 60.0, "r": 3.0, "status": "Mitotic"}
                ],
                "frame_events": []
            }"#,
        )
        .unwrap();

        let analysis = FrameAnalysis::from(resp);
        assert_eq!(analysis.detections.len(), 2);
        assert_eq!(analysis.cell_count, 3);
        assert_eq!(analysis.detections[0].status, "Normal");
        assert_eq!(analysis.detections[1].status, "Mitotic");
    }

    #[test]
    fn test_non_finite_coordinates_dropped() {
        let resp = AnalyzeResponse {
            cell_count: Some(1),
            cells: vec![WireCell {
                x: Some(f64::NAN),
                y: Some(10.0),
                r: Some(1.0),
                status: None,
            }],
            frame_events: vec![],
        };
        assert!(FrameAnalysis::from(resp).detections.is_empty());
    }

    #[test]
    fn test_events_classified_from_free_text() {
        let resp = AnalyzeResponse {
            cell_count: Some(0),
            cells: vec![],
            frame_events: vec![
                "Cell 2 entered anaphase".to_string(),
                "Membrane blebbing suggests cell death".to_string(),
            ],
        };
        let analysis = FrameAnalysis::from(resp);
        assert_eq!(analysis.events[0].kind, EventKind::Mitosis);
        assert_eq!(analysis.events[1].kind, EventKind::Apoptosis);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let resp: AnalyzeResponse = serde_json::from_str("{}").unwrap();
        let analysis = FrameAnalysis::from(resp);
        assert_eq!(analysis.cell_count, 0);
        assert!(analysis.detections.is_empty());
        assert!(analysis.events.is_empty());
    }
}
