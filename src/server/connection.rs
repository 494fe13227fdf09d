//! Per-viewer stream connection
//!
//! Writes every new frame to the socket as raw JPEG bytes, with no framing
//! of its own. Runs until a write fails; there is no idle timeout, a stalled
//! viewer is only noticed when the next write errors.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::context::AppContext;
use crate::session::SessionState;

/// A single stream viewer
pub struct ViewerConnection<S> {
    stream: S,
    state: SessionState,
    ctx: Arc<AppContext>,
}

impl<S> ViewerConnection<S>
where
    S: AsyncWrite + Unpin,
{
    /// Create a connection for an accepted socket
    pub fn new(session_id: u64, stream: S, peer: impl Into<String>, ctx: Arc<AppContext>) -> Self {
        Self {
            stream,
            state: SessionState::new(session_id, peer),
            ctx,
        }
    }

    /// Session state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Register, stream until the peer goes away, then deregister
    ///
    /// Returns the I/O error that ended the session.
    pub async fn run(mut self) -> io::Result<()> {
        let peer = self.state.peer.clone();

        if let Err(e) = self.ctx.sessions.register(&peer).await {
            // Keep the viewer; it receives the placeholder until the device runs
            tracing::warn!(
                prompt = %self.ctx.prompt,
                peer = %peer,
                error = %e,
                "Viewer registered without a running device"
            );
        }
        self.state.start_streaming();
        tracing::info!(
            prompt = %self.ctx.prompt,
            session_id = self.state.id,
            peer = %peer,
            "Is now connected and ready to stream"
        );

        let result = self.stream_frames().await;

        self.state.close();
        let _ = self.stream.shutdown().await;
        let remaining = self.ctx.sessions.deregister(&peer).await;

        tracing::info!(
            prompt = %self.ctx.prompt,
            session_id = self.state.id,
            peer = %peer,
            frames_sent = self.state.stats.frames_sent,
            bytes_sent = self.state.stats.bytes_sent,
            bitrate = self.state.stats.bitrate(),
            active = remaining,
            "Disconnected user"
        );

        result
    }

    async fn stream_frames(&mut self) -> io::Result<()> {
        let mut frames = self.ctx.device.subscribe();

        loop {
            let frame = frames.borrow_and_update().clone();

            if self.state.wants(frame.version()) {
                self.stream.write_all(frame.data()).await?;
                self.stream.flush().await?;
                self.state.on_sent(frame.version(), frame.len());
            }

            if frames.changed().await.is_err() {
                // Device dropped: the process is shutting down
                return Ok(());
            }
        }
    }
}
