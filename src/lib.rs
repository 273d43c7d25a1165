//! Distributed Byte Cache Library
//!
//! This library crate defines the core modules of the cache node. It serves
//! as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! The system is composed of four loosely coupled subsystems:
//!
//! - **`cache`**: The local caching layer. A bounded LRU with eviction
//!   callbacks behind a mutex, plus the immutable `ByteView` value type.
//! - **`peers`**: The placement layer. A consistent-hash ring with virtual
//!   nodes and the contracts for picking and fetching from remote peers.
//! - **`group`**: The coordination layer. Named cache namespaces that compose
//!   local cache, remote-peer fetch, and a fallback loader, with per-key
//!   coalescing of concurrent loads.
//! - **`http`**: The transport layer. Serves peer reads over HTTP and issues
//!   outbound reads to the peers that own a key.

pub mod cache;
pub mod group;
pub mod http;
pub mod peers;
