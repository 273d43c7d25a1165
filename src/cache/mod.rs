//! Local Caching Layer
//!
//! Implements the per-node bounded cache that backs every group.
//!
//! ## Core Concepts
//! - **`ByteView`**: the immutable value type; copies out, never leaks the
//!   underlying buffer.
//! - **`LruCache`**: a byte-bounded least-recently-used map with an optional
//!   eviction callback.
//! - **`GuardedCache`**: the LRU behind a mutex, constructed lazily on the
//!   first write.

pub mod guarded;
pub mod lru;
pub mod view;
