//! Network surfaces
//!
//! Two listeners share one [`AppContext`](crate::context::AppContext):
//!
//! - the stream server writes raw JPEG bytes to every connected viewer
//! - the control plane answers HTTP queries and adjusts the session count
//!
//! [`FeedServer`] runs both until shutdown.

pub mod config;
pub mod connection;
pub mod control;
pub mod listener;
pub mod supervisor;

pub use config::ServerConfig;
pub use connection::ViewerConnection;
pub use control::router;
pub use listener::StreamServer;
pub use supervisor::FeedServer;
