use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// Fetches a value for a group/key pair from one specific peer.
///
/// Implementations own the transport; the HTTP pool provides one fetcher per
/// peer URL. Returned bytes are freshly allocated by the transport.
#[async_trait]
pub trait PeerFetcher: Send + Sync {
    async fn fetch(&self, group: &str, key: &str) -> Result<Vec<u8>>;
}

/// Locates the peer that owns a key.
///
/// Returns `None` when the key belongs to the local node (or no peers are
/// configured), in which case the caller falls back to its own loader.
pub trait PeerPicker: Send + Sync {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>>;
}
