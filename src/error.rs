//! Crate-level error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use crate::device::error::{CaptureError, DeviceError};

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Socket or filesystem I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Capture device failure
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid TOML or has wrong field types
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}
