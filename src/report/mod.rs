//! Run Aggregation and Report Generation
//!
//! ## Responsibilities
//!
//! - Aggregate run-level statistics from tracked frames
//! - Generate the short template-based summary locally
//! - Request the long narrative from the report service
//!
//! Only aggregate numbers cross the report-service boundary, never raw
//! images or per-cell detail. A report-service failure substitutes a
//! fixed fallback narrative; the numeric results stay authoritative.

use crate::error::{Error, Result};
use crate::tracker::types::{EventKind, FrameResult};
use serde::Serialize;
use std::time::Duration;

/// Fallback narrative when the report service is unavailable
pub const FALLBACK_NARRATIVE: &str = "## Analysis Report\n\n\
Narrative generation was unavailable for this run. The tracked frames, \
population figures and event tallies above are complete and authoritative.";

/// Event counts by kind across the whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventTally {
    pub mitosis: u64,
    pub apoptosis: u64,
    pub interaction: u64,
    pub growth: u64,
    pub observation: u64,
}

impl EventTally {
    /// Tally events across all frames
    pub fn count(frames: &[FrameResult]) -> Self {
        let mut tally = Self::default();
        for frame in frames {
            for event in &frame.events {
                match event.kind {
                    EventKind::Mitosis => tally.mitosis += 1,
                    EventKind::Apoptosis => tally.apoptosis += 1,
                    EventKind::Interaction => tally.interaction += 1,
                    EventKind::Growth => tally.growth += 1,
                    EventKind::Observation => tally.observation += 1,
                }
            }
        }
        tally
    }

    /// Total events of all kinds
    pub fn total(&self) -> u64 {
        self.mitosis + self.apoptosis + self.interaction + self.growth + self.observation
    }
}

/// Run-level statistics
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// Timestamp of the last analyzed frame (seconds)
    pub duration_secs: f64,
    /// Population of the first frame (service count estimate)
    pub initial_population: u32,
    /// Population of the last frame
    pub final_population: u32,
    /// Highest population across all frames
    pub peak_population: u32,
    /// Frames that produced a result
    pub frames_analyzed: usize,
    /// Sampled timestamps skipped because no frame could be fetched
    pub frames_skipped: usize,
    /// Distinct cell identities minted over the run
    pub unique_cells: u64,
    /// Detections across all frames
    pub total_detections: usize,
    /// Event tallies by kind
    pub events: EventTally,
}

/// Compute run statistics from the tracked frame sequence.
///
/// `frames` must be non-empty; the orchestrator guarantees it.
pub fn aggregate(frames: &[FrameResult], frames_skipped: usize, unique_cells: u64) -> RunStats {
    let counts = frames.iter().map(|f| f.cell_count);

    RunStats {
        duration_secs: frames.last().map(|f| f.timestamp).unwrap_or(0.0),
        initial_population: frames.first().map(|f| f.cell_count).unwrap_or(0),
        final_population: frames.last().map(|f| f.cell_count).unwrap_or(0),
        peak_population: counts.max().unwrap_or(0),
        frames_analyzed: frames.len(),
        frames_skipped,
        unique_cells,
        total_detections: frames.iter().map(|f| f.cells.len()).sum(),
        events: EventTally::count(frames),
    }
}

/// Template-based short summary of a run
pub fn summary_text(stats: &RunStats) -> String {
    format!(
        "Tracked {} cells across {} frames ({:.1}s): population {} -> {} (peak {}).\n\
         Events: {} mitosis, {} apoptosis, {} interaction, {} growth, {} observation.",
        stats.unique_cells,
        stats.frames_analyzed,
        stats.duration_secs,
        stats.initial_population,
        stats.final_population,
        stats.peak_population,
        stats.events.mitosis,
        stats.events.apoptosis,
        stats.events.interaction,
        stats.events.growth,
        stats.events.observation,
    )
}

/// Flat key/value record sent to the report service.
///
/// Deliberately contains only aggregate numbers.
pub fn report_payload(stats: &RunStats) -> serde_json::Value {
    serde_json::json!({
        "duration_secs": stats.duration_secs,
        "initial_population": stats.initial_population,
        "final_population": stats.final_population,
        "peak_population": stats.peak_population,
        "frames_analyzed": stats.frames_analyzed,
        "frames_skipped": stats.frames_skipped,
        "unique_cells": stats.unique_cells,
        "total_detections": stats.total_detections,
        "mitosis_events": stats.events.mitosis,
        "apoptosis_events": stats.events.apoptosis,
        "interaction_events": stats.events.interaction,
        "growth_events": stats.events.growth,
        "observation_events": stats.events.observation,
    })
}

/// Narrative prose boundary, abstracted for orchestration and tests
pub trait ReportService {
    /// Produce the long-form narrative for the aggregated run
    fn narrative(&self, stats: &RunStats)
        -> impl std::future::Future<Output = Result<String>>;
}

/// HTTP client for the report-writing service
pub struct ReportClient {
    http: reqwest::Client,
    base_url: String,
}

impl ReportClient {
    /// Create a report client
    pub fn new(base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self { http, base_url }
    }
}

impl ReportService for ReportClient {
    /// POST the aggregates, read back markdown prose
    async fn narrative(&self, stats: &RunStats) -> Result<String> {
        let url = format!("{}/v1/report", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&report_payload(stats))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::Report(format!(
                "report service returned {}",
                resp.status()
            )));
        }

        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Err(Error::Report("report service returned empty body".to_string()));
        }

        Ok(text)
    }
}
