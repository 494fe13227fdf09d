//! Stream viewer client
//!
//! The stream carries back-to-back JPEG images with no length prefix, so
//! frames are recovered by scanning for SOI/EOI markers.

use std::io;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::media::FrameSplitter;

const READ_CHUNK: usize = 4096;

/// Reads JPEG frames from a stream server
///
/// # Example
/// ```no_run
/// use camfeed::client::StreamReceiver;
///
/// # async fn example() -> std::io::Result<()> {
/// let mut receiver = StreamReceiver::connect("127.0.0.1:8000").await?;
/// while let Some(frame) = receiver.next_frame().await? {
///     println!("frame: {} bytes", frame.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct StreamReceiver {
    socket: TcpStream,
    splitter: FrameSplitter,
    buf: Vec<u8>,
    frames_received: u64,
}

impl StreamReceiver {
    /// Connect to a stream server
    pub async fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let socket = TcpStream::connect(addr).await?;
        Ok(Self::from_stream(socket))
    }

    /// Wrap an already connected socket
    pub fn from_stream(socket: TcpStream) -> Self {
        Self {
            socket,
            splitter: FrameSplitter::new(),
            buf: vec![0u8; READ_CHUNK],
            frames_received: 0,
        }
    }

    /// Next complete frame, or `None` once the server closes the stream
    ///
    /// A partial frame left at close is discarded.
    pub async fn next_frame(&mut self) -> io::Result<Option<Bytes>> {
        loop {
            if let Some(frame) = self.splitter.next_frame() {
                self.frames_received += 1;
                return Ok(Some(frame));
            }

            let n = self.socket.read(&mut self.buf).await?;
            if n == 0 {
                if self.splitter.pending() > 0 {
                    tracing::debug!(bytes = self.splitter.pending(), "Discarding partial frame");
                }
                return Ok(None);
            }
            self.splitter.push(&self.buf[..n]);
        }
    }

    /// Frames returned so far
    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }
}
