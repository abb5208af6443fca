//! cytolapse - Time-Lapse Microscopy Analysis Pipeline
//!
//! Ingests a time-lapse microscopy video, samples it under a frame
//! budget, asks a vision model to detect and phenotype cells per frame,
//! links detections into persistent tracked identities, and aggregates
//! run statistics plus a narrative report.
//!
//! ## Architecture (6 Components)
//!
//! 1. VideoSource - ffmpeg-backed frame probing/extraction
//! 2. Sampler - adaptive timestamp selection under a frame budget
//! 3. Inference - vision-service client with retry/backoff
//! 4. Tracker - cross-frame greedy nearest-neighbor identity linking
//! 5. Pipeline - sequential orchestration, progress, failure isolation
//! 6. Report - run aggregation, summary text, narrative generation
//!
//! ## Design Principles
//!
//! - Strictly sequential frames: the tracker's state for frame i derives
//!   only from frames 0..i-1 in timestamp order
//! - Per-frame failures degrade, never abort: only "no usable frames"
//!   is terminal
//! - Aggregates, never raw imagery, cross the report boundary

pub mod config;
pub mod error;
pub mod inference;
pub mod pipeline;
pub mod report;
pub mod sampler;
pub mod tracker;
pub mod video_source;

pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use pipeline::{run_analysis, AnalysisPipeline, AnalysisResult};
