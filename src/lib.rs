//! camfeed: demand-driven camera capture and multi-viewer JPEG streaming
//!
//! A single capture device (hardware camera or looping motion-JPEG file)
//! is shared by any number of viewers. The device only runs while at least
//! one viewer is registered.
//!
//! # Quick Start
//!
//! ```no_run
//! use camfeed::{AppConfig, AppContext, FeedServer};
//!
//! # async fn example() -> camfeed::error::Result<()> {
//! let config = AppConfig::default();
//! let ctx = AppContext::new(&config)?;
//! FeedServer::new(config.server.clone(), ctx).run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Surfaces
//!
//! - stream port (default 8000): raw back-to-back JPEG images per viewer
//! - control port (default 8080): `/frame`, `/info`, `/connect`,
//!   `/disconnect`, `/information`, `/stats`

pub mod client;
pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod media;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use config::AppConfig;
pub use context::AppContext;
pub use device::{CaptureMode, Device, DeviceConfig, Frame};
pub use error::{Error, Result};
pub use registry::SessionRegistry;
pub use server::{FeedServer, ServerConfig, StreamServer};
