//! Capture device and its worker loop
//!
//! The device owns a single versioned frame slot (`tokio::sync::watch`). The
//! capture worker is a plain OS thread because reading a camera and encoding
//! JPEG are blocking operations; it is the only writer. Network tasks read the
//! slot or await its change notification and never block on the worker.
//!
//! ```text
//!   CaptureSource ──read──► compress ──publish──► watch<Frame> ──► viewers
//!        ▲                                             │
//!        └──────────── capture thread ─────────────────┘  (version + 1)
//! ```
//!
//! Every publish goes through the slot's write lock and is tagged with the
//! run generation, so a worker that was stopped can never overwrite frames of
//! the run that replaced it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use image::RgbImage;
use tokio::sync::watch;

use super::compress::{compress, placeholder};
use super::config::DeviceConfig;
use super::error::{CaptureError, DeviceError};
use super::frame::Frame;
use super::source::{CaptureSource, SourceKind, SourceOpener, SystemOpener};
use crate::stats::{CaptureSnapshot, CaptureStats};

/// State shared between the device handle and its capture worker
struct Shared {
    frames: watch::Sender<Frame>,
    placeholder: Bytes,
    generation: AtomicU64,
    stats: CaptureStats,
}

impl Shared {
    /// Publish `data` if `generation` is still the current run
    fn publish(&self, generation: u64, data: Bytes) -> Option<u64> {
        let mut version = None;
        self.frames.send_if_modified(|frame| {
            if self.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            *frame = frame.next(data);
            version = Some(frame.version());
            true
        });
        version
    }

    fn reset(&self, generation: u64) -> Option<u64> {
        self.publish(generation, self.placeholder.clone())
    }
}

/// Handle to a capture worker thread
///
/// Stays in the slot after a stop until the next start joins it, so the
/// source is known to be released before it is opened again.
struct Worker {
    running: Arc<AtomicBool>,
    generation: u64,
    thread: JoinHandle<()>,
}

impl Worker {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Block until the thread has exited and dropped its source
    fn join(self, label: &str) {
        if self.thread.join().is_err() {
            tracing::error!(prompt = %label, generation = self.generation, "Capture worker panicked");
        }
    }
}

/// Capture device
///
/// Lives for the whole process and toggles between running and stopped any
/// number of times. While stopped, the current frame is a black placeholder
/// of the configured resolution.
pub struct Device {
    config: DeviceConfig,
    opener: Arc<dyn SourceOpener>,
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
    starting: tokio::sync::Mutex<()>,
    label: Arc<str>,
}

impl Device {
    /// Create a device backed by the system camera/file sources
    pub fn new(config: DeviceConfig) -> Result<Self, DeviceError> {
        Self::with_opener(config, SystemOpener)
    }

    /// Create a device with a custom source opener
    pub fn with_opener(
        config: DeviceConfig,
        opener: impl SourceOpener,
    ) -> Result<Self, DeviceError> {
        let placeholder = placeholder(config.resolution, config.min_quality)?;
        let (frames, _) = watch::channel(Frame::new(0, placeholder.clone()));

        Ok(Self {
            config,
            opener: Arc::new(opener),
            shared: Arc::new(Shared {
                frames,
                placeholder,
                generation: AtomicU64::new(0),
                stats: CaptureStats::new(),
            }),
            worker: Mutex::new(None),
            starting: tokio::sync::Mutex::new(()),
            label: Arc::from("server"),
        })
    }

    /// Set the label attached to lifecycle log events
    pub fn with_label(mut self, label: impl AsRef<str>) -> Self {
        self.label = Arc::from(label.as_ref());
        self
    }

    /// Device configuration
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Snapshot of the current frame
    pub fn current_frame(&self) -> Frame {
        self.shared.frames.borrow().clone()
    }

    /// Receiver notified on every publish
    pub fn subscribe(&self) -> watch::Receiver<Frame> {
        self.shared.frames.subscribe()
    }

    /// Encoded placeholder served while stopped
    pub fn placeholder(&self) -> &Bytes {
        &self.shared.placeholder
    }

    /// Capture counters
    pub fn stats(&self) -> CaptureSnapshot {
        self.shared.stats.snapshot()
    }

    /// Whether a capture worker is active
    pub fn is_running(&self) -> bool {
        self.lock_worker().as_ref().is_some_and(Worker::is_running)
    }

    /// Start capturing
    ///
    /// No-op when already running. A previous worker is joined before the
    /// source is opened again, since hardware cameras refuse a second open.
    /// Joining and opening happen on the blocking pool; an open failure is
    /// returned to the caller and leaves the device stopped.
    pub async fn start(&self) -> Result<(), DeviceError> {
        let _starting = self.starting.lock().await;

        let previous = {
            let mut slot = self.lock_worker();
            if slot.as_ref().is_some_and(Worker::is_running) {
                tracing::debug!(prompt = %self.label, "Device already running");
                return Ok(());
            }
            slot.take()
        };

        let opener = Arc::clone(&self.opener);
        let config = self.config.clone();
        let label = Arc::clone(&self.label);
        let source = tokio::task::spawn_blocking(move || {
            if let Some(previous) = previous {
                previous.join(&label);
            }
            opener.open(&config)
        })
        .await
        .map_err(|e| DeviceError::Task(e.to_string()))??;
        let description = source.describe();

        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let running = Arc::new(AtomicBool::new(true));
        let capture = CaptureLoop {
            source,
            running: Arc::clone(&running),
            shared: Arc::clone(&self.shared),
            generation,
            interval: self.config.frame_interval(),
            min_quality: self.config.min_quality,
            label: Arc::clone(&self.label),
        };

        let thread = match thread::Builder::new()
            .name("camfeed-capture".into())
            .spawn(move || capture.run())
        {
            Ok(thread) => thread,
            Err(e) => {
                self.shared.reset(generation);
                return Err(DeviceError::Spawn(e));
            }
        };

        *self.lock_worker() = Some(Worker {
            running,
            generation,
            thread,
        });

        tracing::info!(
            prompt = %self.label,
            source = %description,
            mode = %self.config.target,
            generation = generation,
            "Is now trying to stream video"
        );

        Ok(())
    }

    /// Stop capturing
    ///
    /// Idempotent and non-blocking. The worker is woken from its pacing
    /// wait, releases the source and restores the placeholder frame.
    pub fn stop(&self) {
        if let Some(worker) = self.lock_worker().as_ref() {
            if worker.running.swap(false, Ordering::AcqRel) {
                worker.thread.thread().unpark();
                tracing::info!(
                    prompt = %self.label,
                    generation = worker.generation,
                    "Stopping capture"
                );
            }
        }
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Blocking capture/compress loop run on the worker thread
struct CaptureLoop {
    source: Box<dyn CaptureSource>,
    running: Arc<AtomicBool>,
    shared: Arc<Shared>,
    generation: u64,
    interval: Option<Duration>,
    min_quality: u8,
    label: Arc<str>,
}

impl CaptureLoop {
    fn run(mut self) {
        let mut deadline = Instant::now();

        while self.running.load(Ordering::Acquire) {
            if let Err(e) = self.cycle() {
                tracing::error!(
                    prompt = %self.label,
                    source = %self.source.describe(),
                    error = %e,
                    "Capture failed, worker exiting"
                );
                break;
            }

            if let Some(interval) = self.interval {
                deadline += interval;
                let now = Instant::now();
                if deadline > now {
                    self.pause_until(deadline);
                } else {
                    deadline = now;
                }
            }
        }

        self.running.store(false, Ordering::Release);
        drop(self.source);
        self.shared.reset(self.generation);

        tracing::info!(
            prompt = %self.label,
            generation = self.generation,
            "Capture stopped, source released"
        );
    }

    /// Wait for the next frame slot; `Device::stop` unparks early
    fn pause_until(&self, deadline: Instant) {
        while self.running.load(Ordering::Acquire) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
    }

    /// One capture cycle
    fn cycle(&mut self) -> Result<(), CaptureError> {
        match self.source.read_frame() {
            Ok(Some(image)) => {
                self.publish(&image);
                Ok(())
            }
            Ok(None) => self.restart(),
            Err(e) if self.source.kind() == SourceKind::File => {
                tracing::debug!(error = %e, "Frame read failed, treating as end of stream");
                self.restart()
            }
            Err(e) => Err(e),
        }
    }

    fn restart(&mut self) -> Result<(), CaptureError> {
        self.shared.stats.record_rewind();
        tracing::debug!(source = %self.source.describe(), "End of stream, rewinding");
        self.source.rewind()
    }

    fn publish(&self, image: &RgbImage) {
        match compress(image, self.min_quality) {
            Ok(encoded) => {
                let size = encoded.data.len();
                if let Some(version) = self.shared.publish(self.generation, encoded.data) {
                    self.shared.stats.record_frame(size, encoded.quality);
                    tracing::trace!(
                        version = version,
                        quality = encoded.quality,
                        bytes = size,
                        "Frame published"
                    );
                }
            }
            Err(e) => {
                self.shared.stats.record_skip();
                tracing::warn!(error = %e, "Frame compression failed, skipping");
            }
        }
    }
}
