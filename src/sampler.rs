//! Adaptive Frame Sampler
//!
//! Picks which timestamps of a video to send through inference. The
//! interval stretches with video length so a run never exceeds the frame
//! budget, while short videos still get sampled across their whole
//! timeline down to the interval floor.

use crate::config::SamplingConfig;

/// Compute the ordered timestamps (seconds) to sample.
///
/// `interval = max(min_interval, duration / max_frames)`; emit 0, then
/// multiples of the interval while below `duration`, stopping once
/// `max_frames` timestamps exist. The cap wins over covering the full
/// duration.
///
/// A non-positive duration yields `[0.0]` only. Non-finite durations must
/// be substituted by the caller before sampling (see
/// `VideoHandle::effective_duration`).
pub fn sample_timestamps(duration_secs: f64, config: &SamplingConfig) -> Vec<f64> {
    if duration_secs <= 0.0 {
        return vec![0.0];
    }

    let interval = (duration_secs / config.max_frames as f64).max(config.min_interval_secs);

    let mut timestamps = Vec::with_capacity(config.max_frames);
    let mut t = 0.0;
    while t < duration_secs && timestamps.len() < config.max_frames {
        timestamps.push(t);
        t += interval;
    }

    tracing::debug!(
        duration_secs = duration_secs,
        interval_secs = interval,
        count = timestamps.len(),
        "Sampled timestamps"
    );

    timestamps
}
