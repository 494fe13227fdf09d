//! Viewer session state machine
//!
//! Tracks one stream viewer from accept to disconnect:
//! `Connected → Streaming → Closed`.

use crate::stats::ViewerStats;

/// Viewer lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Socket accepted, not yet registered
    Connected,
    /// Registered and receiving frames
    Streaming,
    /// Deregistered, socket closed
    Closed,
}

/// Per-viewer session state
#[derive(Debug)]
pub struct SessionState {
    /// Unique session ID
    pub id: u64,

    /// Remote peer address, as registered with the session registry
    pub peer: String,

    /// Current phase
    pub phase: SessionPhase,

    /// Last frame version written to this viewer
    pub last_version: Option<u64>,

    /// Send statistics
    pub stats: ViewerStats,
}

impl SessionState {
    /// Create a new session state
    pub fn new(id: u64, peer: impl Into<String>) -> Self {
        Self {
            id,
            peer: peer.into(),
            phase: SessionPhase::Connected,
            last_version: None,
            stats: ViewerStats::new(),
        }
    }

    /// Transition to streaming
    pub fn start_streaming(&mut self) {
        if self.phase == SessionPhase::Connected {
            self.phase = SessionPhase::Streaming;
        }
    }

    /// Whether a frame with `version` should be written
    ///
    /// Only strictly newer frames are sent, so a viewer never goes back to
    /// an older version.
    pub fn wants(&self, version: u64) -> bool {
        self.last_version.map_or(true, |last| version > last)
    }

    /// Record a frame written to the socket
    pub fn on_sent(&mut self, version: u64, size: usize) {
        self.last_version = Some(version);
        self.stats.on_frame(size);
    }

    /// Close the session
    pub fn close(&mut self) {
        self.phase = SessionPhase::Closed;
    }

    /// Check if the session is streaming
    pub fn is_streaming(&self) -> bool {
        self.phase == SessionPhase::Streaming
    }
}
