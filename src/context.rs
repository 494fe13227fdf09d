//! Shared application context
//!
//! Built once at startup and handed (as `Arc<AppContext>`) to every stream
//! connection and control plane handler.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::device::{Device, DeviceError, SourceOpener, SystemOpener};
use crate::registry::SessionRegistry;

/// Device plus the registry that drives it
pub struct AppContext {
    /// Capture device
    pub device: Arc<Device>,
    /// Viewer session registry
    pub sessions: SessionRegistry,
    /// Label attached to log events
    pub prompt: Arc<str>,
}

impl AppContext {
    /// Build the context with the system capture sources
    pub fn new(config: &AppConfig) -> Result<Arc<Self>, DeviceError> {
        Self::with_opener(config, SystemOpener)
    }

    /// Build the context with a custom source opener
    pub fn with_opener(
        config: &AppConfig,
        opener: impl SourceOpener,
    ) -> Result<Arc<Self>, DeviceError> {
        let prompt = config.server.prompt_user.as_str();
        let device =
            Arc::new(Device::with_opener(config.camera.clone(), opener)?.with_label(prompt));
        let sessions = SessionRegistry::new(Arc::clone(&device)).with_label(prompt);

        Ok(Arc::new(Self {
            device,
            sessions,
            prompt: Arc::from(prompt),
        }))
    }
}
