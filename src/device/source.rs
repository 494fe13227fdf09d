//! Capture sources
//!
//! A `CaptureSource` produces raw RGB frames on demand. Sources are blocking
//! and are only ever driven from the capture worker thread.

use std::fs::File;
use std::io::{self, Read};
use std::ops::Range;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use image::{ImageFormat, RgbImage};

use super::config::{CaptureMode, DeviceConfig};
use super::error::CaptureError;
use super::ffmpeg::FfmpegVideo;
use crate::media::mjpeg;

/// Kind of capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Live hardware camera
    Camera,
    /// File decoder; read failures mean end of stream
    File,
}

/// A blocking producer of raw frames
pub trait CaptureSource: Send {
    /// Read the next frame
    ///
    /// `Ok(None)` signals end of stream.
    fn read_frame(&mut self) -> Result<Option<RgbImage>, CaptureError>;

    /// Seek back to the first frame
    fn rewind(&mut self) -> Result<(), CaptureError>;

    /// What kind of source this is
    fn kind(&self) -> SourceKind;

    /// Human readable description for logs
    fn describe(&self) -> String;
}

/// Opens capture sources for a device configuration
pub trait SourceOpener: Send + Sync + 'static {
    /// Open a source; failure is reported by `Device::start`
    fn open(&self, config: &DeviceConfig) -> Result<Box<dyn CaptureSource>, CaptureError>;
}

/// Opener for the real hardware/file sources
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl SourceOpener for SystemOpener {
    fn open(&self, config: &DeviceConfig) -> Result<Box<dyn CaptureSource>, CaptureError> {
        match config.target {
            CaptureMode::Camera => open_camera(config),
            CaptureMode::Video => open_video(&config.video_source),
        }
    }
}

/// Motion-JPEG files are indexed in memory; anything else goes through ffmpeg
fn open_video(path: &Path) -> Result<Box<dyn CaptureSource>, CaptureError> {
    if is_motion_jpeg(path)? {
        Ok(Box::new(VideoFile::open(path)?))
    } else {
        Ok(Box::new(FfmpegVideo::open(path)?))
    }
}

fn is_motion_jpeg(path: &Path) -> Result<bool, CaptureError> {
    let io_error = |source| CaptureError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut head = [0u8; 2];
    match File::open(path).map_err(io_error)?.read_exact(&mut head) {
        Ok(()) => Ok(head == mjpeg::SOI),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(io_error(e)),
    }
}

#[cfg(feature = "camera")]
fn open_camera(config: &DeviceConfig) -> Result<Box<dyn CaptureSource>, CaptureError> {
    Ok(Box::new(super::camera::CameraSource::open(config)?))
}

#[cfg(not(feature = "camera"))]
fn open_camera(config: &DeviceConfig) -> Result<Box<dyn CaptureSource>, CaptureError> {
    tracing::warn!(
        port = config.capture_port,
        fallback = %config.video_source.display(),
        "Hardware camera support not built in, using generic decoder"
    );
    open_video(&config.video_source)
}

/// Looping motion-JPEG file decoder
///
/// The file is a plain concatenation of JPEG images (for example the output
/// of `ffmpeg -i input.mp4 -f mjpeg out.mjpeg`). Frame boundaries are indexed
/// once at open; each read decodes one frame.
pub struct VideoFile {
    path: PathBuf,
    data: Bytes,
    frames: Vec<Range<usize>>,
    position: usize,
}

impl VideoFile {
    /// Open and index a motion-JPEG file
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let data = std::fs::read(path).map_err(|source| CaptureError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_bytes(path, Bytes::from(data))
    }

    /// Build a decoder over in-memory motion-JPEG data
    pub fn from_bytes(path: impl Into<PathBuf>, data: Bytes) -> Result<Self, CaptureError> {
        let path = path.into();
        let frames = mjpeg::index_frames(&data);

        if frames.is_empty() {
            return Err(CaptureError::NoFrames(path));
        }

        Ok(Self {
            path,
            data,
            frames,
            position: 0,
        })
    }

    /// Number of frames in the file
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Index of the next frame to be read
    pub fn position(&self) -> usize {
        self.position
    }
}

impl CaptureSource for VideoFile {
    fn read_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        let Some(range) = self.frames.get(self.position).cloned() else {
            return Ok(None);
        };
        self.position += 1;

        let image = image::load_from_memory_with_format(&self.data[range], ImageFormat::Jpeg)?;
        Ok(Some(image.to_rgb8()))
    }

    fn rewind(&mut self) -> Result<(), CaptureError> {
        self.position = 0;
        Ok(())
    }

    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn describe(&self) -> String {
        format!("{} ({} frames)", self.path.display(), self.frames.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::compress::compress;
    use image::Rgb;
    use std::io::Write;

    fn mjpeg_clip(shades: &[u8]) -> Vec<u8> {
        let mut clip = Vec::new();
        for &shade in shades {
            let image = RgbImage::from_pixel(16, 8, Rgb([shade, shade, shade]));
            clip.extend_from_slice(&compress(&image, 90).unwrap().data);
        }
        clip
    }

    #[test]
    fn test_video_file_loops() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&mjpeg_clip(&[10, 200])).unwrap();

        let mut video = VideoFile::open(file.path()).unwrap();
        assert_eq!(video.frame_count(), 2);
        assert_eq!(video.kind(), SourceKind::File);

        let first = video.read_frame().unwrap().unwrap();
        assert_eq!(first.dimensions(), (16, 8));
        assert!(video.read_frame().unwrap().is_some());
        assert!(video.read_frame().unwrap().is_none());

        video.rewind().unwrap();
        assert_eq!(video.position(), 0);
        assert!(video.read_frame().unwrap().is_some());
    }

    #[test]
    fn test_video_file_missing() {
        let result = VideoFile::open(Path::new("/nonexistent/feed.mjpeg"));
        assert!(matches!(result, Err(CaptureError::Io { .. })));
    }

    #[test]
    fn test_video_file_without_frames() {
        let result = VideoFile::from_bytes("empty.mjpeg", Bytes::from_static(b"not a jpeg"));
        assert!(matches!(result, Err(CaptureError::NoFrames(_))));
    }

    #[test]
    fn test_corrupt_frame_is_a_read_error() {
        let data = Bytes::from_static(&[0xFF, 0xD8, 0x00, 0x01, 0xFF, 0xD9]);
        let mut video = VideoFile::from_bytes("broken.mjpeg", data).unwrap();

        assert!(matches!(video.read_frame(), Err(CaptureError::Decode(_))));
    }

    #[test]
    fn test_system_opener_video_mode() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&mjpeg_clip(&[50])).unwrap();

        let config = DeviceConfig::default()
            .target(CaptureMode::Video)
            .video_source(file.path());
        let source = SystemOpener.open(&config).unwrap();

        assert_eq!(source.kind(), SourceKind::File);
        assert!(source.describe().contains("1 frames"));
    }

    #[test]
    fn test_system_opener_hands_other_files_to_ffmpeg() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"RIFF....AVI garbage").unwrap();

        let config = DeviceConfig::default()
            .target(CaptureMode::Video)
            .video_source(file.path());
        let result = SystemOpener.open(&config);

        assert!(matches!(
            result,
            Err(CaptureError::NoFrames(_) | CaptureError::Decoder { .. })
        ));
    }
}
