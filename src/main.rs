//! camfeed server
//!
//! Run with: camfeed [--config camfeed.toml] [--mode video --video loop.mjpeg]

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use camfeed::{AppConfig, AppContext, CaptureMode, FeedServer};

#[derive(Debug, Parser)]
#[command(name = "camfeed", version, about = "Camera capture and JPEG streaming server")]
struct Cli {
    /// Configuration file (defaults are used when it does not exist)
    #[arg(short, long, default_value = "camfeed.toml")]
    config: PathBuf,

    /// Capture mode override
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Looping video file override
    #[arg(long)]
    video: Option<PathBuf>,

    /// Stream listener override
    #[arg(long)]
    stream_addr: Option<SocketAddr>,

    /// Control plane listener override
    #[arg(long)]
    http_addr: Option<SocketAddr>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Mode {
    Camera,
    Video,
}

impl From<Mode> for CaptureMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Camera => CaptureMode::Camera,
            Mode::Video => CaptureMode::Video,
        }
    }
}

impl Cli {
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(mode) = self.mode {
            config.camera.target = mode.into();
        }
        if let Some(video) = self.video {
            config.camera.video_source = video;
        }
        if let Some(addr) = self.stream_addr {
            config.server.stream_addr = addr;
        }
        if let Some(addr) = self.http_addr {
            config.server.http_addr = addr;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let config = cli.apply(config);

    tracing::info!(
        prompt = %config.server.prompt_user,
        target = %config.camera.target,
        resolution = %config.camera.resolution,
        fps = config.camera.fps,
        "Starting camfeed"
    );

    let ctx = AppContext::new(&config).context("Failed to prepare capture device")?;
    FeedServer::new(config.server.clone(), ctx)
        .run_until(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// `RUST_LOG` directives when given and valid, `info` otherwise
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = sigterm() => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(unix)]
async fn sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn sigterm() {
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_respects_rust_log() {
        assert_eq!(log_filter(Some("debug")).to_string(), "debug");
        assert_eq!(log_filter(Some("camfeed=trace")).to_string(), "camfeed=trace");
    }

    #[test]
    fn test_log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).to_string(), "info");
        assert_eq!(log_filter(Some("camfeed=loudest")).to_string(), "info");
    }
}
