//! Analysis configuration
//!
//! All knobs for a single analysis run. Defaults come from environment
//! variables where an override makes sense in deployment, with hardcoded
//! fallbacks otherwise.

use std::time::Duration;

/// Top-level configuration for one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Vision inference server URL
    pub vision_url: String,
    /// Report generation server URL
    pub report_url: String,
    /// Frame sampling parameters
    pub sampling: SamplingConfig,
    /// Inference retry parameters
    pub retry: RetryConfig,
    /// Cross-frame tracker parameters
    pub tracker: TrackerConfig,
    /// Substitute duration when the container reports none (seconds)
    pub fallback_duration_secs: f64,
    /// Per-frame extraction wall-clock bound (seconds)
    pub frame_timeout_secs: u64,
    /// Longest image side sent to inference (pixels)
    pub max_image_dim: u32,
    /// JPEG re-encode quality for inference payloads
    pub jpeg_quality: u8,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            vision_url: std::env::var("VISION_URL")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            report_url: std::env::var("REPORT_URL")
                .unwrap_or_else(|_| "http://localhost:9100".to_string()),
            sampling: SamplingConfig::default(),
            retry: RetryConfig::default(),
            tracker: TrackerConfig::default(),
            fallback_duration_secs: 60.0,
            frame_timeout_secs: std::env::var("FRAME_TIMEOUT_SEC")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            max_image_dim: 1024,
            jpeg_quality: 70,
        }
    }
}

/// Adaptive sampling parameters
#[derive(Debug, Clone)]
pub struct SamplingConfig {
    /// Hard cap on sampled frames per run
    pub max_frames: usize,
    /// Floor on the spacing between samples (seconds)
    pub min_interval_secs: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_frames: std::env::var("MAX_FRAMES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            min_interval_secs: 1.0,
        }
    }
}

/// Inference retry/backoff parameters
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts per frame before degrading to an empty result
    pub max_attempts: u32,
    /// Backoff base; attempt n waits base * 2^n
    pub backoff_base: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Exponential backoff delay before re-attempting, attempt indexed from 0
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt)
    }
}

/// Cross-frame tracker parameters
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Max link distance between frames, in percent-of-frame-width units.
    /// Wide on purpose: adjacent samples can be many seconds apart.
    pub link_threshold: f64,
    /// Motion history kept per cell (oldest evicted first)
    pub history_len: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            link_threshold: 25.0,
            history_len: 10,
        }
    }
}
