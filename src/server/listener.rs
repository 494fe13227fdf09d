//! Stream server listener
//!
//! Handles the TCP accept loop and spawns one viewer task per connection.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::context::AppContext;
use crate::error::Result;
use crate::server::config::ServerConfig;
use crate::server::connection::ViewerConnection;

/// Raw JPEG stream server
pub struct StreamServer {
    config: ServerConfig,
    ctx: Arc<AppContext>,
    next_session_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl StreamServer {
    /// Create a new stream server
    pub fn new(config: ServerConfig, ctx: Arc<AppContext>) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            ctx,
            next_session_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Bind the configured stream address and serve forever
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.stream_addr).await?;
        self.serve(listener).await
    }

    /// Serve viewers on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        tracing::info!(
            prompt = %self.ctx.prompt,
            addr = %listener.local_addr()?,
            "Initializing the socket protocol"
        );

        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(prompt = %self.ctx.prompt, error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(
                        prompt = %self.ctx.prompt,
                        peer = %peer_addr,
                        "Connection rejected: limit reached"
                    );
                    return;
                }
            }
        } else {
            None
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(session_id = session_id, peer = %peer_addr, "New connection");

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        let ctx = Arc::clone(&self.ctx);

        tokio::spawn(async move {
            let _permit = permit;
            let connection = ViewerConnection::new(session_id, socket, peer_addr.to_string(), ctx);

            if let Err(e) = connection.run().await {
                tracing::debug!(session_id = session_id, error = %e, "Connection error");
            }
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        Ok(())
    }

    /// Get the configured stream address
    pub fn stream_addr(&self) -> SocketAddr {
        self.config.stream_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::device::testing::PatternOpener;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_connection_limit() {
        let mut config = AppConfig::default();
        config.camera = config.camera.resolution(16, 16).fps(50);
        let ctx = AppContext::with_opener(&config, PatternOpener::default()).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = StreamServer::new(ServerConfig::default().max_connections(1), Arc::clone(&ctx));
        let handle = tokio::spawn(async move { server.serve(listener).await });

        let mut first = TcpStream::connect(addr).await.unwrap();
        let mut buf = [0u8; 64];
        assert!(first.read(&mut buf).await.unwrap() > 0);

        // Second viewer is dropped without registering
        let mut second = TcpStream::connect(addr).await.unwrap();
        let n = tokio::time::timeout(Duration::from_secs(5), second.read(&mut buf))
            .await
            .unwrap()
            .unwrap_or(0);
        assert_eq!(n, 0);
        assert_eq!(ctx.sessions.active_count().await, 1);

        handle.abort();
        drop(first);
    }
}
