//! Stream viewer client
//!
//! Connects to a stream server and yields whole JPEG frames.

pub mod receiver;

pub use receiver::StreamReceiver;
