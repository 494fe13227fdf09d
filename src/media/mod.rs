//! Media handling for the feed
//!
//! This module provides:
//! - JPEG start/end marker scanning for the raw stream
//! - Incremental frame splitting for stream consumers

pub mod mjpeg;

pub use mjpeg::{find_frame, index_frames, FrameSplitter, EOI, SOI};
