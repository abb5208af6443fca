//! Analysis Pipeline Orchestrator
//!
//! ## Responsibilities
//!
//! - Drive sampler -> frame source -> inference -> tracker in strict
//!   timestamp order, one frame at a time
//! - Isolate per-frame failures: a failed fetch skips the timestamp, a
//!   failed inference yields an empty frame result
//! - Surface the terminal "no usable frames" condition
//! - Report monotonic progress milestones
//!
//! Frames are processed strictly sequentially. The tracker needs the
//! fully-resolved previous frame before it can link the next, so frame
//! `i`'s state derives only from frames `0..i-1` in timestamp order;
//! inference latency is accepted as the dominant cost.

pub mod progress;

use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::inference::{FrameAnalysis, VisionClient, VisionService};
use crate::report::{
    aggregate, summary_text, ReportClient, ReportService, RunStats, FALLBACK_NARRATIVE,
};
use crate::sampler::sample_timestamps;
use crate::tracker::types::FrameResult;
use crate::tracker::CellTracker;
use crate::video_source::{FfmpegFrameSource, FrameSource};
use progress::{ProgressCallback, ProgressReporter};
use serde::Serialize;
use std::path::PathBuf;

/// Progress span boundaries: setup ends at 10, inference ends at 85,
/// post-processing fills the rest.
const SETUP_DONE_PERCENT: u8 = 10;
const INFERENCE_DONE_PERCENT: u8 = 85;

/// Terminal artifact of one analysis run, read-only for consumers
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Completion time of the run
    pub generated_at: chrono::DateTime<chrono::Utc>,
    /// One entry per successfully fetched frame, ordered by timestamp
    pub frames: Vec<FrameResult>,
    /// Run-level statistics
    pub stats: RunStats,
    /// Short template summary
    pub summary: String,
    /// Long narrative (service-generated, or the fixed fallback)
    pub extended_report: String,
}

/// Sequential analysis pipeline over pluggable service boundaries
pub struct AnalysisPipeline<S, V, R> {
    source: S,
    vision: V,
    report: R,
    config: AnalysisConfig,
}

impl<S, V, R> AnalysisPipeline<S, V, R>
where
    S: FrameSource,
    V: VisionService,
    R: ReportService,
{
    /// Assemble a pipeline from its collaborators
    pub fn new(source: S, vision: V, report: R, config: AnalysisConfig) -> Self {
        Self {
            source,
            vision,
            report,
            config,
        }
    }

    /// Run the full analysis.
    ///
    /// Fails only when the video cannot be probed at all or when zero
    /// sampled timestamps produce a frame; every smaller failure
    /// degrades per frame.
    pub async fn run(&self, progress: &mut ProgressReporter) -> Result<AnalysisResult> {
        progress.report(0, "Probing video");
        let handle = self.source.probe().await?;
        let duration = handle.effective_duration(self.config.fallback_duration_secs);

        let timestamps = sample_timestamps(duration, &self.config.sampling);
        let total = timestamps.len();
        progress.report(
            SETUP_DONE_PERCENT,
            &format!("Sampling {} frames across {:.1}s", total, duration),
        );

        let mut tracker = CellTracker::new(self.config.tracker.clone());
        let mut frames: Vec<FrameResult> = Vec::with_capacity(total);
        let mut skipped = 0usize;

        for (index, &timestamp) in timestamps.iter().enumerate() {
            let image = match self.source.frame_at(timestamp).await {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(
                        timestamp_secs = timestamp,
                        error = %e,
                        "Frame unavailable, skipping timestamp"
                    );
                    skipped += 1;
                    progress.report(
                        inference_percent(index, total),
                        &format!("Frame {}/{} unavailable, skipped", index + 1, total),
                    );
                    continue;
                }
            };

            // A per-frame inference error is absorbed here even though
            // the client already degrades internally; stub services in
            // tests surface errors directly.
            let analysis = match self.vision.analyze(&image, timestamp).await {
                Ok(analysis) => analysis,
                Err(e) => {
                    tracing::error!(
                        timestamp_secs = timestamp,
                        error = %e,
                        "Inference failed, recording empty frame"
                    );
                    FrameAnalysis::empty()
                }
            };

            let frame = tracker.advance(
                timestamp,
                analysis.cell_count,
                &analysis.detections,
                analysis.events,
            );
            frames.push(frame);

            progress.report(
                inference_percent(index, total),
                &format!("Analyzed frame {}/{}", index + 1, total),
            );
        }

        if frames.is_empty() {
            return Err(Error::NoUsableFrames(format!(
                "all {} sampled timestamps failed",
                total
            )));
        }

        progress.report(INFERENCE_DONE_PERCENT, "Aggregating results");
        let stats = aggregate(&frames, skipped, tracker.ids_minted());
        let summary = summary_text(&stats);

        progress.report(90, "Generating report");
        let extended_report = match self.report.narrative(&stats).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Report generation failed, using fallback narrative");
                FALLBACK_NARRATIVE.to_string()
            }
        };

        progress.report(100, "Analysis complete");

        tracing::info!(
            frames = stats.frames_analyzed,
            skipped = stats.frames_skipped,
            cells = stats.unique_cells,
            events = stats.events.total(),
            "Analysis finished"
        );

        Ok(AnalysisResult {
            generated_at: chrono::Utc::now(),
            frames,
            stats,
            summary,
            extended_report,
        })
    }
}

/// Percent after finishing frame `index` of `total`, linear across the
/// inference span
fn inference_percent(index: usize, total: usize) -> u8 {
    let span = (INFERENCE_DONE_PERCENT - SETUP_DONE_PERCENT) as usize;
    let done = span * (index + 1) / total.max(1);
    SETUP_DONE_PERCENT + done as u8
}

/// Run a full analysis over a local video file with the production
/// collaborators (ffmpeg frame source, HTTP vision and report services).
pub async fn run_analysis(
    video_path: PathBuf,
    config: AnalysisConfig,
    progress_callback: ProgressCallback,
) -> Result<AnalysisResult> {
    let source = FfmpegFrameSource::new(
        video_path,
        config.frame_timeout_secs,
        config.max_image_dim,
        config.jpeg_quality,
    );
    let vision = VisionClient::new(config.vision_url.clone(), config.retry.clone());
    let report = ReportClient::new(config.report_url.clone());

    let pipeline = AnalysisPipeline::new(source, vision, report, config);
    let mut progress = ProgressReporter::new(progress_callback);
    pipeline.run(&mut progress).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_percent_linear_and_bounded() {
        assert_eq!(inference_percent(0, 10), 17);
        assert_eq!(inference_percent(4, 10), 47);
        assert_eq!(inference_percent(9, 10), 85);
    }

    #[test]
    fn test_inference_percent_single_frame() {
        assert_eq!(inference_percent(0, 1), 85);
    }

    #[test]
    fn test_inference_percent_zero_total_does_not_panic() {
        assert!(inference_percent(0, 0) >= SETUP_DONE_PERCENT);
    }
}
