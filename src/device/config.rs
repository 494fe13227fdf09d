//! Capture device configuration

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which capture source the device drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Hardware camera (falls back to the file decoder when unsupported)
    Camera,
    /// Looping motion-JPEG file
    Video,
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureMode::Camera => write!(f, "camera"),
            CaptureMode::Video => write!(f, "video"),
        }
    }
}

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Create a resolution
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<[u32; 2]> for Resolution {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<Resolution> for [u32; 2] {
    fn from(r: Resolution) -> Self {
        [r.width, r.height]
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Device configuration
///
/// Set once at startup; the device never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Capture mode
    pub target: CaptureMode,

    /// Capture resolution (also the placeholder size)
    pub resolution: Resolution,

    /// Target frame rate (0 = as fast as the source delivers)
    pub fps: u32,

    /// Hardware camera index
    pub capture_port: u32,

    /// Motion-JPEG file used in video mode and as the camera fallback
    pub video_source: PathBuf,

    /// Lower bound of the adaptive JPEG quality
    pub min_quality: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            target: CaptureMode::Video,
            resolution: Resolution::new(640, 480),
            fps: 30,
            capture_port: 0,
            video_source: PathBuf::from("video.mjpeg"),
            min_quality: 30,
        }
    }
}

impl DeviceConfig {
    /// Set the capture mode
    pub fn target(mut self, target: CaptureMode) -> Self {
        self.target = target;
        self
    }

    /// Set the resolution
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = Resolution::new(width, height);
        self
    }

    /// Set the frame rate
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the camera index
    pub fn capture_port(mut self, port: u32) -> Self {
        self.capture_port = port;
        self
    }

    /// Set the video file
    pub fn video_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.video_source = path.into();
        self
    }

    /// Set the minimum JPEG quality
    pub fn min_quality(mut self, quality: u8) -> Self {
        self.min_quality = quality;
        self
    }

    /// Time budget of one capture cycle, `None` when unpaced
    pub fn frame_interval(&self) -> Option<Duration> {
        (self.fps > 0).then(|| Duration::from_secs(1) / self.fps)
    }
}
