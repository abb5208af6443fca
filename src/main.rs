//! cytolapse - Time-lapse microscopy analysis CLI
//!
//! Runs one analysis over a video file and prints the summary and the
//! narrative report.

use cytolapse::{run_analysis, AnalysisConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cytolapse=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting cytolapse v{}", env!("CARGO_PKG_VERSION"));

    let video_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("Usage: cytolapse <video-path>");
            std::process::exit(2);
        }
    };

    let config = AnalysisConfig::default();
    tracing::info!(
        video = %video_path.display(),
        vision_url = %config.vision_url,
        report_url = %config.report_url,
        max_frames = config.sampling.max_frames,
        "Configuration loaded"
    );

    let progress = Box::new(|percent: u8, message: &str| {
        tracing::info!(percent = percent, "{}", message);
    });

    let result = match run_analysis(video_path, config, progress).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(code = e.code(), error = %e, "Analysis failed");
            anyhow::bail!("analysis failed ({})", e.code());
        }
    };

    println!("{}", result.summary);
    println!();
    println!("{}", result.extended_report);

    Ok(())
}
