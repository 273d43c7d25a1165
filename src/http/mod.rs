//! HTTP Peer Transport
//!
//! Connects the nodes of the cluster. Each node serves its groups to peers
//! under a common base path and issues outbound reads to whichever peer the
//! hash ring names as the owner of a key.
//!
//! ## Core Concepts
//! - **`pool`**: `HttpPool` implements the picker contract over a hash ring
//!   and keeps one fetcher client per peer URL.
//! - **`handlers`**: the axum handlers bridging HTTP requests to group
//!   lookups, plus the node status endpoint.
//! - **`protocol`**: the base path, replication factor, and status DTOs.

pub mod handlers;
pub mod pool;
pub mod protocol;
