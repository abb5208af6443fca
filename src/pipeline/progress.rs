//! Progress reporting
//!
//! One-way observer interface: the pipeline pushes (percent, message)
//! milestones, nothing flows back. Percent is clamped so observers see a
//! monotonically non-decreasing sequence ending at 100, regardless of
//! caller arithmetic.

/// Observer callback invoked at every milestone
pub type ProgressCallback = Box<dyn Fn(u8, &str) + Send + Sync>;

/// Monotonic progress sink wrapping a callback
pub struct ProgressReporter {
    callback: ProgressCallback,
    last: u8,
}

impl ProgressReporter {
    /// Wrap a callback
    pub fn new(callback: ProgressCallback) -> Self {
        Self { callback, last: 0 }
    }

    /// Reporter that discards all milestones
    pub fn noop() -> Self {
        Self::new(Box::new(|_, _| {}))
    }

    /// Report a milestone; percent never goes backwards or above 100
    pub fn report(&mut self, percent: u8, message: &str) {
        let clamped = percent.clamp(self.last, 100);
        self.last = clamped;
        (self.callback)(clamped, message);
    }
}
