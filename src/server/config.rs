//! Server configuration

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Server configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address of the raw frame stream
    pub stream_addr: SocketAddr,

    /// Address of the HTTP control plane
    pub http_addr: SocketAddr,

    /// Label identifying this server in log events
    pub prompt_user: String,

    /// Maximum concurrent stream viewers (0 = unlimited)
    pub max_connections: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            stream_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            prompt_user: "server".to_string(),
            max_connections: 0, // Unlimited
            tcp_nodelay: true,  // Frames are written whole, no need to coalesce
        }
    }
}

impl ServerConfig {
    /// Set the stream address
    pub fn stream_addr(mut self, addr: SocketAddr) -> Self {
        self.stream_addr = addr;
        self
    }

    /// Set the control plane address
    pub fn http_addr(mut self, addr: SocketAddr) -> Self {
        self.http_addr = addr;
        self
    }

    /// Set the log label
    pub fn prompt_user(mut self, label: impl Into<String>) -> Self {
        self.prompt_user = label.into();
        self
    }

    /// Set maximum stream viewers
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.stream_addr.port(), 8000);
        assert_eq!(config.http_addr.port(), 8080);
        assert_eq!(config.max_connections, 0);
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_builder_chaining() {
        let stream: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let http: SocketAddr = "127.0.0.1:9001".parse().unwrap();
        let config = ServerConfig::default()
            .stream_addr(stream)
            .http_addr(http)
            .prompt_user("porch")
            .max_connections(8)
            .tcp_nodelay(false);

        assert_eq!(config.stream_addr, stream);
        assert_eq!(config.http_addr, http);
        assert_eq!(config.prompt_user, "porch");
        assert_eq!(config.max_connections, 8);
        assert!(!config.tcp_nodelay);
    }

    #[test]
    fn test_deserialize_addresses() {
        let config: ServerConfig = toml::from_str(
            r#"
            stream_addr = "127.0.0.1:7000"
            prompt_user = "garage"
            "#,
        )
        .unwrap();

        assert_eq!(config.stream_addr.port(), 7000);
        assert_eq!(config.http_addr.port(), 8080);
        assert_eq!(config.prompt_user, "garage");
    }
}
