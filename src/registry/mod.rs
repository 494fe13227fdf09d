//! Session registry for demand-driven capture
//!
//! The registry counts active viewers and owns the decision of when the
//! device runs: the camera is started when the first viewer arrives and
//! stopped when the last one leaves.
//!
//! # Architecture
//!
//! ```text
//!   [stream socket accept]   [GET /connect]
//!            │                     │
//!            └──── register() ─────┤ increment()
//!                                  ▼
//!                     Mutex<RegistryState { active, addresses, armed }>
//!                                  │
//!                         transition(prev, now, armed)
//!                                  │
//!                      ┌───────────┴───────────┐
//!                 Device::start()         Device::stop()
//!                 (0 → nonzero)           (nonzero → 0)
//! ```
//!
//! Stream viewers and control plane calls share one counter; an HTTP
//! `connect` is not tied to any socket.

pub mod store;
pub mod transition;

pub use store::SessionRegistry;
pub use transition::{transition, DeviceAction};
