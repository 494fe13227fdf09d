//! Statistics for the capture worker and viewer sessions

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Capture-side counters
///
/// Written by the capture worker, read by the control plane without locking.
#[derive(Debug, Default)]
pub struct CaptureStats {
    frames_encoded: AtomicU64,
    bytes_encoded: AtomicU64,
    frames_skipped: AtomicU64,
    rewinds: AtomicU64,
    last_quality: AtomicU64,
}

impl CaptureStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a published frame
    pub fn record_frame(&self, bytes: usize, quality: u32) {
        self.frames_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded.fetch_add(bytes as u64, Ordering::Relaxed);
        self.last_quality.store(u64::from(quality), Ordering::Relaxed);
    }

    /// Record a frame dropped because it could not be encoded
    pub fn record_skip(&self) {
        self.frames_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an end-of-stream restart
    pub fn record_rewind(&self) {
        self.rewinds.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            frames_encoded: self.frames_encoded.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            rewinds: self.rewinds.load(Ordering::Relaxed),
            last_quality: self.last_quality.load(Ordering::Relaxed),
        }
    }
}

/// Serializable copy of `CaptureStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureSnapshot {
    /// Frames compressed and published
    pub frames_encoded: u64,
    /// Total JPEG bytes produced
    pub bytes_encoded: u64,
    /// Frames dropped by encode failures
    pub frames_skipped: u64,
    /// End-of-stream restarts of a file source
    pub rewinds: u64,
    /// Quality chosen for the most recent frame
    pub last_quality: u64,
}

/// Per-viewer statistics
#[derive(Debug, Clone)]
pub struct ViewerStats {
    /// Connection start
    pub connected_at: Instant,
    /// Frames written to the socket
    pub frames_sent: u64,
    /// Bytes written to the socket
    pub bytes_sent: u64,
}

impl ViewerStats {
    pub fn new() -> Self {
        Self {
            connected_at: Instant::now(),
            frames_sent: 0,
            bytes_sent: 0,
        }
    }

    /// Record one frame written
    pub fn on_frame(&mut self, size: usize) {
        self.frames_sent += 1;
        self.bytes_sent += size as u64;
    }

    /// Time since the viewer connected
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Average send rate in bits per second
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration().as_secs();
        if secs > 0 {
            (self.bytes_sent * 8) / secs
        } else {
            0
        }
    }
}

impl Default for ViewerStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_stats_new() {
        let stats = CaptureStats::new();
        assert_eq!(stats.snapshot(), CaptureSnapshot::default());
    }

    #[test]
    fn test_capture_stats_counts() {
        let stats = CaptureStats::new();
        stats.record_frame(1_000, 30);
        stats.record_frame(2_500, 42);
        stats.record_skip();
        stats.record_rewind();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_encoded, 2);
        assert_eq!(snapshot.bytes_encoded, 3_500);
        assert_eq!(snapshot.frames_skipped, 1);
        assert_eq!(snapshot.rewinds, 1);
        assert_eq!(snapshot.last_quality, 42);
    }

    #[test]
    fn test_viewer_stats() {
        let mut stats = ViewerStats::new();
        stats.on_frame(100);
        stats.on_frame(50);

        assert_eq!(stats.frames_sent, 2);
        assert_eq!(stats.bytes_sent, 150);
    }

    #[test]
    fn test_viewer_bitrate_zero_duration() {
        let mut stats = ViewerStats::new();
        stats.on_frame(1_000_000);

        // Less than a second has passed
        assert_eq!(stats.bitrate(), 0);
    }
}
