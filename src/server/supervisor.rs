//! Runs the stream server and the control plane side by side

use std::future::{Future, IntoFuture};
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::context::AppContext;
use crate::error::Result;
use crate::server::config::ServerConfig;
use crate::server::control::router;
use crate::server::listener::StreamServer;

/// Both network surfaces over one shared context
///
/// Either surface failing ends the whole server; the capture device is
/// stopped on the way out.
pub struct FeedServer {
    config: ServerConfig,
    ctx: Arc<AppContext>,
}

impl FeedServer {
    pub fn new(config: ServerConfig, ctx: Arc<AppContext>) -> Self {
        Self { config, ctx }
    }

    /// Shared context
    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    /// Bind both configured addresses and serve until an error occurs
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Bind both configured addresses and serve until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let stream_listener = TcpListener::bind(self.config.stream_addr).await?;
        let http_listener = TcpListener::bind(self.config.http_addr).await?;
        self.serve_with_listeners(stream_listener, http_listener, shutdown)
            .await
    }

    /// Serve on already bound listeners until `shutdown` resolves
    pub async fn serve_with_listeners<F>(
        self,
        stream_listener: TcpListener,
        http_listener: TcpListener,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let prompt = Arc::clone(&self.ctx.prompt);
        let http_addr = http_listener.local_addr()?;
        let stream_server = StreamServer::new(self.config.clone(), Arc::clone(&self.ctx));
        let app = router(Arc::clone(&self.ctx));

        tracing::info!(prompt = %prompt, addr = %http_addr, "Initializing the control plane");

        let result = tokio::select! {
            result = stream_server.serve(stream_listener) => result,
            result = axum::serve(http_listener, app).into_future() => result.map_err(Into::into),
            _ = shutdown => {
                tracing::info!(prompt = %prompt, "Shutting down");
                Ok(())
            }
        };

        self.ctx.device.stop();
        result
    }
}
