//! Capture device
//!
//! The device turns a capture source (hardware camera or looping video file)
//! into a stream of JPEG frames. Capture runs only while the device is
//! started; the session registry decides when that is.
//!
//! Motion-JPEG files are indexed in memory. Other video files are decoded
//! through an `ffmpeg` child process.
//!
//! # Architecture
//!
//! ```text
//!                         Arc<Device>
//!              ┌──────────────────────────────┐
//!              │ config: DeviceConfig          │
//!              │ frames: watch::Sender<Frame>  │◄── capture thread
//!              │ worker: Option<Worker>        │    (read → compress → publish)
//!              └──────────────┬───────────────┘
//!                             │ subscribe() / current_frame()
//!          ┌──────────────────┼──────────────────┐
//!          ▼                  ▼                  ▼
//!     [viewer task]      [viewer task]      [GET /frame]
//! ```

#[cfg(feature = "camera")]
pub mod camera;
pub mod capture;
pub mod compress;
pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use capture::Device;
pub use compress::{compress, frame_energy, quality_for, Encoded};
pub use config::{CaptureMode, DeviceConfig, Resolution};
pub use error::{CaptureError, DeviceError};
pub use ffmpeg::FfmpegVideo;
pub use frame::Frame;
pub use source::{CaptureSource, SourceKind, SourceOpener, SystemOpener, VideoFile};
