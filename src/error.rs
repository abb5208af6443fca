//! Error handling for the cytolapse analysis pipeline

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Every sampled timestamp failed to produce a frame
    #[error("No usable frames: {0}")]
    NoUsableFrames(String),

    /// Frame source failure (probe/seek/decode)
    #[error("Frame source error: {0}")]
    FrameSource(String),

    /// Vision inference failure
    #[error("Inference error: {0}")]
    Inference(String),

    /// Report generation failure
    #[error("Report error: {0}")]
    Report(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short machine-readable code for the error kind.
    ///
    /// User-facing surfaces key their messages off this code instead of
    /// surfacing raw implementation errors.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NoUsableFrames(_) => "NO_USABLE_FRAMES",
            Error::FrameSource(_) => "FRAME_SOURCE_ERROR",
            Error::Inference(_) => "INFERENCE_ERROR",
            Error::Report(_) => "REPORT_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Http(_) => "HTTP_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
