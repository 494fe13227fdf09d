//! Generic video file decoder
//!
//! Any container or codec ffmpeg understands is transcoded to a motion-JPEG
//! pipe (`-f image2pipe -vcodec mjpeg`) and split with the marker scanner.
//! Rewinding restarts the process from the top of the file.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use image::{ImageFormat, RgbImage};

use super::error::CaptureError;
use super::source::{CaptureSource, SourceKind};
use crate::media::FrameSplitter;

const READ_CHUNK: usize = 64 * 1024;

/// Looping decoder backed by an `ffmpeg` child process
pub struct FfmpegVideo {
    path: PathBuf,
    child: Child,
    stdout: ChildStdout,
    splitter: FrameSplitter,
    buf: Vec<u8>,
    first: Option<RgbImage>,
}

impl FfmpegVideo {
    /// Start decoding `path`
    ///
    /// The first frame is decoded eagerly so an unreadable file, or a host
    /// without ffmpeg, fails here rather than in the capture loop.
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        std::fs::metadata(path).map_err(|source| CaptureError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let (child, stdout) = spawn(path)?;
        let mut video = Self {
            path: path.to_path_buf(),
            child,
            stdout,
            splitter: FrameSplitter::new(),
            buf: vec![0u8; READ_CHUNK],
            first: None,
        };

        match video.next_image()? {
            Some(image) => video.first = Some(image),
            None => return Err(CaptureError::NoFrames(video.path.clone())),
        }
        Ok(video)
    }

    fn next_image(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        loop {
            if let Some(frame) = self.splitter.next_frame() {
                let image = image::load_from_memory_with_format(&frame, ImageFormat::Jpeg)?;
                return Ok(Some(image.to_rgb8()));
            }

            let n = self.stdout.read(&mut self.buf).map_err(|source| CaptureError::Decoder {
                path: self.path.clone(),
                source,
            })?;
            if n == 0 {
                return Ok(None);
            }
            self.splitter.push(&self.buf[..n]);
        }
    }

    fn reap(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn spawn(path: &Path) -> Result<(Child, ChildStdout), CaptureError> {
    let decoder_error = |source| CaptureError::Decoder {
        path: path.to_path_buf(),
        source,
    };

    let mut child = Command::new("ffmpeg")
        .args(["-loglevel", "error", "-nostdin", "-i"])
        .arg(path)
        .args(["-f", "image2pipe", "-vcodec", "mjpeg", "-q:v", "3", "-"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(decoder_error)?;

    match child.stdout.take() {
        Some(stdout) => Ok((child, stdout)),
        None => {
            let _ = child.kill();
            let _ = child.wait();
            Err(decoder_error(io::Error::other("ffmpeg stdout not captured")))
        }
    }
}

impl CaptureSource for FfmpegVideo {
    fn read_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        if let Some(image) = self.first.take() {
            return Ok(Some(image));
        }
        self.next_image()
    }

    fn rewind(&mut self) -> Result<(), CaptureError> {
        self.reap();
        let (child, stdout) = spawn(&self.path)?;
        self.child = child;
        self.stdout = stdout;
        self.splitter = FrameSplitter::new();
        self.first = None;
        Ok(())
    }

    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn describe(&self) -> String {
        format!("{} (ffmpeg)", self.path.display())
    }
}

impl Drop for FfmpegVideo {
    fn drop(&mut self) {
        self.reap();
    }
}
