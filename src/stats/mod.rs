//! Capture and viewer statistics

pub mod metrics;

pub use metrics::{CaptureSnapshot, CaptureStats, ViewerStats};
