//! Vision Inference Client
//!
//! ## Responsibilities
//!
//! - Send one frame per call to the vision service
//! - Retry transient failures with exponential backoff
//! - Normalize responses into the internal detection record
//! - Degrade a failed frame to an explicit empty result
//!
//! A frame's inference failure never propagates: after the retry budget
//! is spent (or on a non-retryable failure) the frame yields zero cells
//! and zero events, and the run continues. A whole-video analysis never
//! fails because one frame did.

pub mod classify;
pub mod types;

use crate::config::RetryConfig;
use crate::error::Result;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::time::Duration;

pub use types::{AnalyzeResponse, FrameAnalysis};

/// Task specification sent with every frame
const TASK_SPEC: &str = "Identify every cell visible in this microscopy frame. For each cell \
report its center x and y as percentages of frame width and height, its radius r as a \
percentage of frame width, and a short status label (e.g. Normal, Mitotic, Apoptotic). \
Also report notable events in this frame as free-text strings (division, death, \
cell-to-cell contact). Respond with JSON: {cell_count, cells: [{x, y, r, status}], \
frame_events: [string]}.";

/// Wire schema version echoed to the service
const SCHEMA_VERSION: &str = "2026-06-01.1";

/// Per-frame analysis boundary, abstracted for orchestration and tests
pub trait VisionService {
    /// Analyze one frame image, returning normalized detections
    fn analyze(
        &self,
        image: &[u8],
        timestamp_secs: f64,
    ) -> impl std::future::Future<Output = Result<FrameAnalysis>>;
}

/// Outcome of a single inference attempt
enum AttemptFailure {
    /// Transient server/transport condition; worth retrying
    Transient(String),
    /// Malformed response or client-side rejection; retrying won't help
    Permanent(String),
}

/// Retry loop state
enum RetryState {
    Attempting(u32),
    Waiting { next: u32, delay: Duration },
    Succeeded(FrameAnalysis),
    FailedExhausted(String),
}

/// HTTP client for the vision inference service
pub struct VisionClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl VisionClient {
    /// Create a client with the default 30s request timeout
    pub fn new(base_url: String, retry: RetryConfig) -> Self {
        Self::with_timeout(base_url, retry, Duration::from_secs(30))
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(base_url: String, retry: RetryConfig, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url,
            retry,
        }
    }

    /// Check vision service health
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/healthz", self.base_url);
        match self.http.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// One attempt: build the multipart form, post, decode.
    ///
    /// The form holds owned image bytes so it can be rebuilt on every
    /// attempt (a consumed `Form` cannot be reused across retries).
    async fn attempt(
        &self,
        image: &[u8],
        timestamp_secs: f64,
    ) -> std::result::Result<FrameAnalysis, AttemptFailure> {
        let url = format!("{}/v1/analyze", self.base_url);

        let part = Part::bytes(image.to_vec())
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| AttemptFailure::Permanent(format!("form build failed: {}", e)))?;

        let form = Form::new()
            .part("frame", part)
            .text("timestamp_secs", timestamp_secs.to_string())
            .text("task", TASK_SPEC)
            .text("schema_version", SCHEMA_VERSION);

        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AttemptFailure::Transient(format!("transport: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = format!("inference returned {}: {}", status, body);
            return if status_is_transient(status) {
                Err(AttemptFailure::Transient(message))
            } else {
                Err(AttemptFailure::Permanent(message))
            };
        }

        let decoded: AnalyzeResponse = resp
            .json()
            .await
            .map_err(|e| AttemptFailure::Permanent(format!("malformed response: {}", e)))?;

        Ok(FrameAnalysis::from(decoded))
    }
}

impl VisionService for VisionClient {
    /// Analyze one frame with bounded retry.
    ///
    /// Exhausted retries and permanent failures both resolve to
    /// `FrameAnalysis::empty()` rather than an error.
    async fn analyze(&self, image: &[u8], timestamp_secs: f64) -> Result<FrameAnalysis> {
        let mut state = RetryState::Attempting(0);

        loop {
            state = match state {
                RetryState::Attempting(attempt) => match self.attempt(image, timestamp_secs).await
                {
                    Ok(analysis) => RetryState::Succeeded(analysis),
                    Err(AttemptFailure::Transient(reason))
                        if attempt + 1 < self.retry.max_attempts =>
                    {
                        tracing::warn!(
                            timestamp_secs = timestamp_secs,
                            attempt = attempt,
                            reason = %reason,
                            "Inference attempt failed, backing off"
                        );
                        RetryState::Waiting {
                            next: attempt + 1,
                            delay: self.retry.delay_for(attempt),
                        }
                    }
                    Err(AttemptFailure::Transient(reason)) => RetryState::FailedExhausted(reason),
                    Err(AttemptFailure::Permanent(reason)) => {
                        RetryState::FailedExhausted(format!("non-retryable: {}", reason))
                    }
                },
                RetryState::Waiting { next, delay } => {
                    tokio::time::sleep(delay).await;
                    RetryState::Attempting(next)
                }
                RetryState::Succeeded(analysis) => {
                    tracing::debug!(
                        timestamp_secs = timestamp_secs,
                        cell_count = analysis.cell_count,
                        detections = analysis.detections.len(),
                        events = analysis.events.len(),
                        "Frame analyzed"
                    );
                    return Ok(analysis);
                }
                RetryState::FailedExhausted(reason) => {
                    tracing::error!(
                        timestamp_secs = timestamp_secs,
                        reason = %reason,
                        "Frame inference failed, degrading to empty result"
                    );
                    return Ok(FrameAnalysis::empty());
                }
            };
        }
    }
}

/// Server errors and throttling are worth retrying; anything else is not
fn status_is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}
