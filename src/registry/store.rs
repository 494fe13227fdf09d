//! Session registry implementation
//!
//! Counts active viewers and drives the device lifecycle from that count.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::transition::{transition, DeviceAction};
use crate::device::{Device, DeviceError};

#[derive(Debug)]
struct RegistryState {
    /// Active session count; never negative
    active: usize,
    /// Addresses of registered stream viewers
    addresses: Vec<String>,
    /// Device is waiting for its first listener
    armed: bool,
}

impl RegistryState {
    fn adjust(&mut self, delta: isize) -> Option<DeviceAction> {
        let previous = self.active;
        self.active = previous.saturating_add_signed(delta);
        transition(previous, self.active, self.armed)
    }
}

/// Registry of active viewer sessions
///
/// All mutations are serialized by one async mutex that is held across the
/// device start, so concurrent callers can never both see a zero count and
/// both start the device.
pub struct SessionRegistry {
    device: Arc<Device>,
    state: Mutex<RegistryState>,
    label: Arc<str>,
}

impl SessionRegistry {
    /// Create a registry driving `device`
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            state: Mutex::new(RegistryState {
                active: 0,
                addresses: Vec::new(),
                armed: true,
            }),
            label: Arc::from("server"),
        }
    }

    /// Set the label attached to log events
    pub fn with_label(mut self, label: impl AsRef<str>) -> Self {
        self.label = Arc::from(label.as_ref());
        self
    }

    /// The device driven by this registry
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Register a stream viewer and count it
    ///
    /// The session is counted even when the device fails to start; the
    /// error is returned so the caller can report it.
    pub async fn register(&self, address: &str) -> Result<usize, DeviceError> {
        let mut state = self.state.lock().await;
        state.addresses.push(address.to_string());
        self.raise(&mut state).await
    }

    /// Remove a stream viewer and uncount it
    pub async fn deregister(&self, address: &str) -> usize {
        let mut state = self.state.lock().await;
        if let Some(pos) = state.addresses.iter().position(|a| a == address) {
            state.addresses.remove(pos);
        }
        self.lower(&mut state)
    }

    /// Count one session without an address (control plane connect)
    pub async fn increment(&self) -> Result<usize, DeviceError> {
        let mut state = self.state.lock().await;
        self.raise(&mut state).await
    }

    /// Uncount one session (control plane disconnect); clamps at zero
    pub async fn decrement(&self) -> usize {
        let mut state = self.state.lock().await;
        self.lower(&mut state)
    }

    /// Current session count
    pub async fn active_count(&self) -> usize {
        self.state.lock().await.active
    }

    /// Addresses of registered stream viewers
    pub async fn addresses(&self) -> Vec<String> {
        self.state.lock().await.addresses.clone()
    }

    /// Whether the next 0 → nonzero edge will start the device
    pub async fn is_armed(&self) -> bool {
        self.state.lock().await.armed
    }

    async fn raise(&self, state: &mut RegistryState) -> Result<usize, DeviceError> {
        let mut action = state.adjust(1);
        self.log_listeners(state);

        // A failed start or a dead worker leaves listeners without capture
        if action.is_none() && !self.device.is_running() {
            tracing::warn!(
                prompt = %self.label,
                active = state.active,
                "Device not running with active listeners, restarting"
            );
            action = Some(DeviceAction::Start);
        }

        if action == Some(DeviceAction::Start) {
            if let Err(e) = self.device.start().await {
                tracing::error!(
                    prompt = %self.label,
                    active = state.active,
                    error = %e,
                    "Device failed to start"
                );
                return Err(e);
            }
            state.armed = false;
        }

        Ok(state.active)
    }

    fn lower(&self, state: &mut RegistryState) -> usize {
        if state.adjust(-1) == Some(DeviceAction::Stop) {
            self.device.stop();
            state.armed = true;
        }
        self.log_listeners(state);

        state.active
    }

    fn log_listeners(&self, state: &RegistryState) {
        let listeners = if state.addresses.is_empty() {
            "None".to_string()
        } else {
            state.addresses.join(", ")
        };

        tracing::info!(
            prompt = %self.label,
            active = state.active,
            listeners = %listeners,
            "List of active users"
        );
    }
}
