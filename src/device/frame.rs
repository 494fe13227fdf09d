//! Published frame type

use bytes::Bytes;

/// An encoded frame tagged with its version token
///
/// Cheap to clone: the JPEG bytes are reference counted, readers share the
/// allocation the capture worker produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    version: u64,
    data: Bytes,
}

impl Frame {
    /// Create a frame
    pub fn new(version: u64, data: Bytes) -> Self {
        Self { version, data }
    }

    /// Version token, strictly increasing per publish
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Encoded image bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Size of the encoded image
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame carries no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Successor frame carrying `data`
    pub(crate) fn next(&self, data: Bytes) -> Self {
        Self {
            version: self.version + 1,
            data,
        }
    }
}
