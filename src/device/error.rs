//! Device error types
//!
//! `CaptureError` covers a single source operation (open, read, rewind);
//! `DeviceError` is what `Device::start` reports to its caller.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error from a capture source
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Source file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Source file holds no complete JPEG frame
    #[error("no frames found in {0}")]
    NoFrames(PathBuf),

    /// A frame could not be decoded
    #[error("frame decode failed: {0}")]
    Decode(#[from] image::ImageError),

    /// The external video decoder could not be run or read
    #[error("video decoder failed for {path}: {source}")]
    Decoder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Hardware camera failure (open, configure or read)
    #[error("camera error: {0}")]
    Camera(String),
}

/// Error returned by `Device::start`
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The capture source could not be opened
    #[error("failed to open capture source: {0}")]
    Open(#[from] CaptureError),

    /// The capture worker thread could not be spawned
    #[error("failed to spawn capture worker: {0}")]
    Spawn(#[source] io::Error),

    /// The placeholder frame could not be encoded
    #[error("failed to encode placeholder frame: {0}")]
    Encode(#[from] image::ImageError),

    /// The blocking open task panicked or was cancelled
    #[error("capture open task failed: {0}")]
    Task(String),
}
