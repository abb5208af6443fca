//! Video Frame Source
//!
//! ## Responsibilities
//!
//! - Probe container metadata (duration, native resolution) via ffprobe
//! - Grab one frame at an arbitrary timestamp via ffmpeg seek
//! - Bound payload size before the inference boundary: longest side
//!   capped, JPEG re-encoded at reduced quality
//!
//! Each grab has a wall-clock bound. A timestamp that cannot be served
//! within it is reported as an error and the caller skips it; one bad
//! seek never takes down the run.

use crate::error::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Container metadata, immutable once probed
#[derive(Debug, Clone)]
pub struct VideoHandle {
    /// Duration in seconds; `None` when the container does not report one
    pub duration_secs: Option<f64>,
    /// Native frame width in pixels
    pub width: u32,
    /// Native frame height in pixels
    pub height: u32,
}

impl VideoHandle {
    /// Duration to sample against, substituting `fallback` for an
    /// unknown or non-finite value
    pub fn effective_duration(&self, fallback: f64) -> f64 {
        match self.duration_secs {
            Some(d) if d.is_finite() => d,
            _ => {
                tracing::warn!(
                    fallback_secs = fallback,
                    "Container reports no usable duration, substituting fallback"
                );
                fallback
            }
        }
    }
}

/// Timestamped image supply, abstracted for orchestration and tests
pub trait FrameSource {
    /// Probe the container once at load time
    fn probe(&self) -> impl std::future::Future<Output = Result<VideoHandle>>;

    /// Rasterize the frame nearest `timestamp_secs` as bounded JPEG bytes
    fn frame_at(
        &self,
        timestamp_secs: f64,
    ) -> impl std::future::Future<Output = Result<Vec<u8>>>;
}

/// Frame source backed by ffmpeg/ffprobe on a local video file
pub struct FfmpegFrameSource {
    path: PathBuf,
    /// Per-invocation wall-clock bound
    timeout: Duration,
    /// Longest output side in pixels
    max_dim: u32,
    /// JPEG re-encode quality
    jpeg_quality: u8,
}

impl FfmpegFrameSource {
    /// Create a source for a video file
    pub fn new(path: PathBuf, timeout_secs: u64, max_dim: u32, jpeg_quality: u8) -> Self {
        Self {
            path,
            timeout: Duration::from_secs(timeout_secs),
            max_dim,
            jpeg_quality,
        }
    }

    /// Run a spawned process to completion within the timeout.
    ///
    /// kill_on_drop ensures that when the timeout cancels the wait, the
    /// dropped Child takes the ffmpeg process down with it instead of
    /// leaving a zombie behind an unresponsive seek.
    async fn run_bounded(&self, mut command: Command, what: &str) -> Result<Vec<u8>> {
        let child = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::FrameSource(format!("{} spawn failed: {}", what, e)))?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(Error::FrameSource(format!(
                        "{} failed: {}",
                        what,
                        stderr.trim()
                    )));
                }
                if output.stdout.is_empty() {
                    return Err(Error::FrameSource(format!("{} returned empty output", what)));
                }
                Ok(output.stdout)
            }
            Ok(Err(e)) => Err(Error::FrameSource(format!("{} execution failed: {}", what, e))),
            Err(_) => {
                tracing::warn!(
                    timeout_sec = self.timeout.as_secs(),
                    what = what,
                    "Process timeout, killed via kill_on_drop"
                );
                Err(Error::FrameSource(format!(
                    "{} timeout ({}s)",
                    what,
                    self.timeout.as_secs()
                )))
            }
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    async fn probe(&self) -> Result<VideoHandle> {
        let mut command = Command::new("ffprobe");
        command.args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height:format=duration",
            "-of",
            "json",
        ]);
        command.arg(&self.path);

        let stdout = self.run_bounded(command, "ffprobe").await?;
        let handle = parse_probe_output(&String::from_utf8_lossy(&stdout))?;

        tracing::info!(
            path = %self.path.display(),
            duration_secs = ?handle.duration_secs,
            width = handle.width,
            height = handle.height,
            "Video probed"
        );

        Ok(handle)
    }

    async fn frame_at(&self, timestamp_secs: f64) -> Result<Vec<u8>> {
        let mut command = Command::new("ffmpeg");
        command.args(["-ss", &format!("{:.3}", timestamp_secs), "-i"]);
        command.arg(&self.path);
        command.args([
            "-frames:v",
            "1",
            "-f",
            "image2pipe",
            "-vcodec",
            "mjpeg",
            "-loglevel",
            "error",
            "-y",
            "-",
        ]);

        let raw = self.run_bounded(command, "ffmpeg").await?;
        let bounded = bound_jpeg(&raw, self.max_dim, self.jpeg_quality)?;

        tracing::debug!(
            timestamp_secs = timestamp_secs,
            raw_bytes = raw.len(),
            bounded_bytes = bounded.len(),
            "Frame extracted"
        );

        Ok(bounded)
    }
}

/// Parse ffprobe JSON output into a `VideoHandle`.
///
/// ffprobe reports duration as a string inside `format`; a missing or
/// unparseable value becomes `None` rather than an error.
fn parse_probe_output(json: &str) -> Result<VideoHandle> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| Error::FrameSource(format!("ffprobe output unreadable: {}", e)))?;

    let stream = value
        .get("streams")
        .and_then(|s| s.as_array())
        .and_then(|s| s.first())
        .ok_or_else(|| Error::FrameSource("no video stream in container".to_string()))?;

    let width = stream.get("width").and_then(|w| w.as_u64()).unwrap_or(0) as u32;
    let height = stream.get("height").and_then(|h| h.as_u64()).unwrap_or(0) as u32;

    let duration_secs = value
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|d| d.as_str())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite());

    Ok(VideoHandle {
        duration_secs,
        width,
        height,
    })
}

/// Cap the longest side and re-encode as reduced-quality JPEG.
///
/// Payload-size bounding for the inference boundary, not a fidelity
/// requirement.
fn bound_jpeg(data: &[u8], max_dim: u32, quality: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data)
        .map_err(|e| Error::FrameSource(format!("frame decode failed: {}", e)))?;

    let img = if img.width().max(img.height()) > max_dim {
        img.resize(max_dim, max_dim, FilterType::Triangle)
    } else {
        img
    };

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(std::io::Cursor::new(&mut buf), quality);
    img.write_with_encoder(encoder)
        .map_err(|e| Error::FrameSource(format!("frame encode failed: {}", e)))?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg_of_size(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 120, 120]));
        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(std::io::Cursor::new(&mut buf), 90);
        image::DynamicImage::ImageRgb8(img)
            .write_with_encoder(encoder)
            .unwrap();
        buf
    }

    #[test]
    fn test_oversized_frame_capped_to_max_dim() {
        let data = jpeg_of_size(2000, 500);
        let bounded = bound_jpeg(&data, 1024, 70).unwrap();
        let img = image::load_from_memory(&bounded).unwrap();
        assert!(img.width() <= 1024);
        assert!(img.height() <= 1024);
        // aspect ratio preserved
        assert_eq!(img.width(), 1024);
        assert_eq!(img.height(), 256);
    }

    #[test]
    fn test_small_frame_not_upscaled() {
        let data = jpeg_of_size(320, 240);
        let bounded = bound_jpeg(&data, 1024, 70).unwrap();
        let img = image::load_from_memory(&bounded).unwrap();
        assert_eq!((img.width(), img.height()), (320, 240));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(bound_jpeg(&[0u8; 32], 1024, 70).is_err());
    }

    #[test]
    fn test_probe_output_parsed() {
        let handle = parse_probe_output(
            r#"{"streams":[{"width":1920,"height":1080}],"format":{"duration":"42.500000"}}"#,
        )
        .unwrap();
        assert_eq!(handle.duration_secs, Some(42.5));
        assert_eq!((handle.width, handle.height), (1920, 1080));
    }

    #[test]
    fn test_probe_without_duration() {
        let handle = parse_probe_output(
            r#"{"streams":[{"width":640,"height":480}],"format":{}}"#,
        )
        .unwrap();
        assert_eq!(handle.duration_secs, None);
        assert_eq!(handle.effective_duration(60.0), 60.0);
    }

    #[test]
    fn test_probe_without_stream_fails() {
        assert!(parse_probe_output(r#"{"streams":[],"format":{}}"#).is_err());
    }

    #[test]
    fn test_effective_duration_passes_finite_values() {
        let handle = VideoHandle {
            duration_secs: Some(12.0),
            width: 640,
            height: 480,
        };
        assert_eq!(handle.effective_duration(60.0), 12.0);
    }
}
