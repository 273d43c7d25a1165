use std::fmt;
use std::sync::Arc;

use super::lru::ByteSized;

/// An immutable view of a byte value.
///
/// Values live in the cache as `ByteView`s so that arbitrary payloads
/// (strings, images, serialized records) are handled uniformly. Cloning a
/// view is cheap and shares the buffer; the bytes themselves are never
/// mutated after construction and never handed out by reference.
#[derive(Clone, PartialEq, Eq)]
pub struct ByteView {
    bytes: Arc<[u8]>,
}

impl ByteView {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Number of bytes held by the view.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns a fresh copy of the bytes. Each call allocates its own
    /// buffer, so callers can never reach the cached value through it.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for ByteView {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl ByteSized for ByteView {
    fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteView({} bytes)", self.bytes.len())
    }
}
