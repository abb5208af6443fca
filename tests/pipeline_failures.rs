//! Pipeline failure-isolation and ordering tests over stub boundaries

use cytolapse::config::{AnalysisConfig, RetryConfig, SamplingConfig, TrackerConfig};
use cytolapse::error::{Error, Result};
use cytolapse::inference::{FrameAnalysis, VisionService};
use cytolapse::pipeline::progress::ProgressReporter;
use cytolapse::pipeline::AnalysisPipeline;
use cytolapse::report::{ReportService, RunStats, FALLBACK_NARRATIVE};
use cytolapse::tracker::types::Detection;
use cytolapse::video_source::{FrameSource, VideoHandle};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 10 sampled frames: duration 10s, interval floor 1s
fn test_config() -> AnalysisConfig {
    AnalysisConfig {
        vision_url: "http://unused".to_string(),
        report_url: "http://unused".to_string(),
        sampling: SamplingConfig {
            max_frames: 10,
            min_interval_secs: 1.0,
        },
        retry: RetryConfig {
            max_attempts: 1,
            backoff_base: Duration::from_millis(1),
        },
        tracker: TrackerConfig::default(),
        fallback_duration_secs: 60.0,
        frame_timeout_secs: 1,
        max_image_dim: 1024,
        jpeg_quality: 70,
    }
}

struct StubSource {
    duration: Option<f64>,
    /// Timestamps whose fetch fails
    unavailable: Vec<f64>,
}

impl StubSource {
    fn healthy(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            unavailable: Vec::new(),
        }
    }
}

impl FrameSource for StubSource {
    async fn probe(&self) -> Result<VideoHandle> {
        Ok(VideoHandle {
            duration_secs: self.duration,
            width: 640,
            height: 480,
        })
    }

    async fn frame_at(&self, timestamp_secs: f64) -> Result<Vec<u8>> {
        if self.unavailable.contains(&timestamp_secs) {
            return Err(Error::FrameSource("seek failed".to_string()));
        }
        Ok(vec![0xFF; 64])
    }
}

struct StubVision {
    /// Timestamps whose inference fails
    fail_at: Vec<f64>,
    calls: Arc<Mutex<Vec<f64>>>,
}

impl StubVision {
    fn healthy() -> Self {
        Self {
            fail_at: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing_at(fail_at: Vec<f64>) -> Self {
        Self {
            fail_at,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl VisionService for StubVision {
    async fn analyze(&self, _image: &[u8], timestamp_secs: f64) -> Result<FrameAnalysis> {
        self.calls.lock().unwrap().push(timestamp_secs);
        if self.fail_at.contains(&timestamp_secs) {
            return Err(Error::Inference("service exhausted retries".to_string()));
        }
        // two cells drifting slowly right
        Ok(FrameAnalysis {
            cell_count: 2,
            detections: vec![
                Detection {
                    x: 30.0 + timestamp_secs,
                    y: 40.0,
                    r: 2.0,
                    status: "Normal".to_string(),
                },
                Detection {
                    x: 70.0 + timestamp_secs,
                    y: 60.0,
                    r: 2.5,
                    status: "Normal".to_string(),
                },
            ],
            events: vec![],
        })
    }
}

struct StubReport {
    fail: bool,
}

impl ReportService for StubReport {
    async fn narrative(&self, stats: &RunStats) -> Result<String> {
        if self.fail {
            return Err(Error::Report("report service down".to_string()));
        }
        Ok(format!("## Report\n\n{} frames analyzed.", stats.frames_analyzed))
    }
}

#[tokio::test]
async fn test_inference_failure_isolated_to_one_frame() {
    let pipeline = AnalysisPipeline::new(
        StubSource::healthy(10.0),
        StubVision::failing_at(vec![3.0]),
        StubReport { fail: false },
        test_config(),
    );

    let result = pipeline.run(&mut ProgressReporter::noop()).await.unwrap();

    assert_eq!(result.frames.len(), 10);
    let failed = &result.frames[3];
    assert_eq!(failed.timestamp, 3.0);
    assert_eq!(failed.cell_count, 0);
    assert!(failed.cells.is_empty());
    assert!(failed.events.is_empty());
    // neighbors analyzed normally
    assert_eq!(result.frames[2].cells.len(), 2);
    assert_eq!(result.frames[4].cells.len(), 2);
}

#[tokio::test]
async fn test_all_fetches_failing_is_terminal() {
    let timestamps: Vec<f64> = (0..10).map(|i| i as f64).collect();
    let pipeline = AnalysisPipeline::new(
        StubSource {
            duration: Some(10.0),
            unavailable: timestamps,
        },
        StubVision::healthy(),
        StubReport { fail: false },
        test_config(),
    );

    let err = pipeline.run(&mut ProgressReporter::noop()).await.unwrap_err();
    assert!(matches!(err, Error::NoUsableFrames(_)));
    assert_eq!(err.code(), "NO_USABLE_FRAMES");
}

#[tokio::test]
async fn test_fetch_failure_skips_timestamp_entirely() {
    let vision = StubVision::healthy();
    let calls = vision.calls.clone();
    let pipeline = AnalysisPipeline::new(
        StubSource {
            duration: Some(10.0),
            unavailable: vec![3.0],
        },
        vision,
        StubReport { fail: false },
        test_config(),
    );

    let result = pipeline.run(&mut ProgressReporter::noop()).await.unwrap();

    assert_eq!(result.frames.len(), 9);
    assert!(result.frames.iter().all(|f| f.timestamp != 3.0));
    assert_eq!(result.stats.frames_skipped, 1);
    // inference never saw the skipped timestamp
    assert!(!calls.lock().unwrap().contains(&3.0));
}

#[tokio::test]
async fn test_report_failure_degrades_to_fallback() {
    let pipeline = AnalysisPipeline::new(
        StubSource::healthy(10.0),
        StubVision::healthy(),
        StubReport { fail: true },
        test_config(),
    );

    let result = pipeline.run(&mut ProgressReporter::noop()).await.unwrap();

    assert_eq!(result.extended_report, FALLBACK_NARRATIVE);
    // numeric results remain authoritative
    assert_eq!(result.stats.frames_analyzed, 10);
    assert!(result.summary.contains("10 frames"));
}

#[tokio::test]
async fn test_identities_stable_across_run() {
    let pipeline = AnalysisPipeline::new(
        StubSource::healthy(10.0),
        StubVision::healthy(),
        StubReport { fail: false },
        test_config(),
    );

    let result = pipeline.run(&mut ProgressReporter::noop()).await.unwrap();

    for frame in &result.frames {
        let ids: Vec<u64> = frame.cells.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
    assert_eq!(result.stats.unique_cells, 2);
    // drift of 1%/frame accumulates into bounded history
    let last = result.frames.last().unwrap();
    assert!(!last.cells[0].history.is_empty());
    assert!(last.cells[0].history.len() <= 10);
}

#[tokio::test]
async fn test_progress_is_monotonic_and_completes() {
    let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut progress = ProgressReporter::new(Box::new(move |p, _| {
        sink.lock().unwrap().push(p);
    }));

    let pipeline = AnalysisPipeline::new(
        StubSource::healthy(10.0),
        StubVision::healthy(),
        StubReport { fail: false },
        test_config(),
    );
    pipeline.run(&mut progress).await.unwrap();

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[1] >= w[0]));
    assert_eq!(*seen.last().unwrap(), 100);
}

#[tokio::test]
async fn test_unknown_duration_substitutes_fallback() {
    let pipeline = AnalysisPipeline::new(
        StubSource {
            duration: None,
            unavailable: Vec::new(),
        },
        StubVision::healthy(),
        StubReport { fail: false },
        test_config(),
    );

    let result = pipeline.run(&mut ProgressReporter::noop()).await.unwrap();

    // fallback 60s / 10 frames -> 6s interval, full budget used
    assert_eq!(result.frames.len(), 10);
    assert_eq!(result.frames[1].timestamp, 6.0);
}
