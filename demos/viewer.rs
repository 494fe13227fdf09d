//! Stream viewer example
//!
//! Run with: cargo run --example viewer [STREAM_ADDR] [OUTPUT_DIR]
//!
//! Connects to a camfeed stream port, reports the frame rate every second
//! and, when an output directory is given, writes each frame as a JPEG.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use camfeed::client::StreamReceiver;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("camfeed=info".parse()?)
                .add_directive("viewer=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let addr = args.get(1).map(String::as_str).unwrap_or("127.0.0.1:8000");
    let output = args.get(2).map(PathBuf::from);

    if let Some(ref dir) = output {
        std::fs::create_dir_all(dir)?;
    }

    let mut receiver = StreamReceiver::connect(addr).await?;
    println!("Connected to {}", addr);

    let mut window_start = Instant::now();
    let mut window_frames = 0u32;

    while let Some(frame) = receiver.next_frame().await? {
        window_frames += 1;

        if let Some(ref dir) = output {
            let path = dir.join(format!("frame_{:06}.jpg", receiver.frames_received()));
            std::fs::write(path, &frame)?;
        }

        if window_start.elapsed() >= Duration::from_secs(1) {
            println!(
                "{} fps, last frame {} bytes, {} total",
                window_frames,
                frame.len(),
                receiver.frames_received()
            );
            window_start = Instant::now();
            window_frames = 0;
        }
    }

    println!("Stream closed after {} frames", receiver.frames_received());
    Ok(())
}
