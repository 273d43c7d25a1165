//! Peer Protocol Constants and Status DTOs
//!
//! Peer reads travel as `GET <base_path><group>/<key>` with group and key
//! percent-encoded; a successful response carries the raw value bytes as
//! `application/octet-stream`. The status endpoint speaks JSON.

use serde::{Deserialize, Serialize};

/// Path prefix reserved for peer traffic. Hosts commonly serve more than
/// one API, so peer reads live under their own prefix.
pub const DEFAULT_BASE_PATH: &str = "/_geecache/";

/// Virtual nodes per peer on the hash ring.
pub const DEFAULT_REPLICAS: usize = 50;

/// Per-group cache figures reported by the status endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupStatus {
    pub name: String,
    pub entries: usize,
    pub used_bytes: i64,
    pub cache_bytes: i64,
}

/// Response format for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeStatus {
    pub self_url: String,
    pub peers: Vec<String>,
    pub groups: Vec<GroupStatus>,
    pub cpu_usage: f32,
    pub mem_used_mb: u64,
    pub mem_total_mb: u64,
}
