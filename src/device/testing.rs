//! Synthetic capture sources for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{Rgb, RgbImage};

use super::config::DeviceConfig;
use super::error::CaptureError;
use super::source::{CaptureSource, SourceKind, SourceOpener};

/// Opens `PatternSource`s and counts opens/releases
#[derive(Clone, Default)]
pub struct PatternOpener {
    opens: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    frames_before_eos: Option<usize>,
    fail_after: Option<usize>,
    exclusive: bool,
}

impl PatternOpener {
    /// Behave like a file holding `n` frames
    pub fn frames_before_eos(mut self, n: usize) -> Self {
        self.frames_before_eos = Some(n);
        self
    }

    /// Fail every read after `n` frames, like an unplugged camera
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Refuse to open while an earlier source is still alive
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl SourceOpener for PatternOpener {
    fn open(&self, config: &DeviceConfig) -> Result<Box<dyn CaptureSource>, CaptureError> {
        if self.exclusive && self.opens() > self.released() {
            return Err(CaptureError::Camera("device busy".into()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(PatternSource {
            width: config.resolution.width,
            height: config.resolution.height,
            position: 0,
            frames_before_eos: self.frames_before_eos,
            fail_after: self.fail_after,
            released: Arc::clone(&self.released),
        }))
    }
}

/// Gradient frames; optionally ends after a fixed number of frames
pub struct PatternSource {
    width: u32,
    height: u32,
    position: usize,
    frames_before_eos: Option<usize>,
    fail_after: Option<usize>,
    released: Arc<AtomicUsize>,
}

impl CaptureSource for PatternSource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        if self.fail_after.is_some_and(|n| self.position >= n) {
            return Err(CaptureError::Camera("device unplugged".into()));
        }
        if self.frames_before_eos.is_some_and(|n| self.position >= n) {
            return Ok(None);
        }
        let shade = (self.position * 40 % 256) as u8;
        self.position += 1;
        Ok(Some(RgbImage::from_pixel(
            self.width,
            self.height,
            Rgb([shade, 255 - shade, 128]),
        )))
    }

    fn rewind(&mut self) -> Result<(), CaptureError> {
        self.position = 0;
        Ok(())
    }

    fn kind(&self) -> SourceKind {
        if self.frames_before_eos.is_some() {
            SourceKind::File
        } else {
            SourceKind::Camera
        }
    }

    fn describe(&self) -> String {
        format!("pattern {}x{}", self.width, self.height)
    }
}

impl Drop for PatternSource {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Opener whose hardware is always missing
pub struct FailingOpener;

impl SourceOpener for FailingOpener {
    fn open(&self, _config: &DeviceConfig) -> Result<Box<dyn CaptureSource>, CaptureError> {
        Err(CaptureError::Camera("no camera attached".into()))
    }
}
