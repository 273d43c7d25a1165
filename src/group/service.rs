use std::sync::{Arc, OnceLock};

use anyhow::{Result, bail};

use super::flight::FlightGroup;
use super::loader::Loader;
use crate::cache::guarded::GuardedCache;
use crate::cache::view::ByteView;
use crate::peers::picker::{PeerFetcher, PeerPicker};

/// A named cache namespace.
///
/// Reads follow a fixed precedence: the local cache, then the peer that
/// owns the key on the hash ring, then the group's own loader. Values
/// loaded locally populate the local cache. Values fetched from a peer do
/// not: each key has exactly one owner on the ring, and that owner keeps
/// the cached copy.
pub struct Group {
    name: String,
    loader: Arc<dyn Loader>,
    cache: GuardedCache,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    flight: FlightGroup<ByteView>,
}

impl Group {
    pub(super) fn new(name: &str, cache_bytes: i64, loader: Arc<dyn Loader>) -> Self {
        Self {
            name: name.to_owned(),
            loader,
            cache: GuardedCache::new(cache_bytes),
            peers: OnceLock::new(),
            flight: FlightGroup::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers the peer picker. Settable exactly once.
    ///
    /// # Panics
    ///
    /// Panics on a second call; re-wiring peers is a programming error.
    pub fn register_peers(&self, picker: Arc<dyn PeerPicker>) {
        if self.peers.set(picker).is_err() {
            panic!("register_peers called more than once for group {}", self.name);
        }
    }

    /// Looks up a key, loading it through a peer or the loader on a miss.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            bail!("key is required");
        }
        if let Some(view) = self.cache.get(key) {
            tracing::debug!(group = %self.name, key, "cache hit");
            return Ok(view);
        }
        self.load(key).await
    }

    /// Loads a missing key, collapsing concurrent loads for the same key
    /// into a single peer fetch or loader invocation.
    async fn load(&self, key: &str) -> Result<ByteView> {
        self.flight.run(key, || self.load_uncoalesced(key)).await
    }

    async fn load_uncoalesced(&self, key: &str) -> Result<ByteView> {
        if let Some(picker) = self.peers.get()
            && let Some(peer) = picker.pick_peer(key)
        {
            match self.fetch_from_peer(peer.as_ref(), key).await {
                Ok(view) => return Ok(view),
                Err(e) => {
                    tracing::warn!(group = %self.name, key, "peer fetch failed: {e:#}");
                }
            }
        }
        self.load_locally(key).await
    }

    /// Fetches the value from the owning peer. The result is not added to
    /// the local cache.
    async fn fetch_from_peer(&self, peer: &dyn PeerFetcher, key: &str) -> Result<ByteView> {
        let bytes = peer.fetch(&self.name, key).await?;
        Ok(ByteView::new(bytes))
    }

    /// Invokes the loader and populates the local cache.
    async fn load_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = self.loader.load(key).await?;
        let view = ByteView::new(bytes);
        self.cache.add(key, view.clone());
        Ok(view)
    }

    pub fn cache_entries(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_used_bytes(&self) -> i64 {
        self.cache.used_bytes()
    }

    pub fn cache_bytes(&self) -> i64 {
        self.cache.capacity()
    }
}
