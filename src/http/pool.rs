use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use axum::Router;
use axum::extract::Extension;
use axum::routing::get;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode, Url};

use super::handlers;
use super::protocol::{DEFAULT_BASE_PATH, DEFAULT_REPLICAS};
use crate::group::registry::Registry;
use crate::peers::picker::{PeerFetcher, PeerPicker};
use crate::peers::ring::HashRing;

/// The HTTP side of a cache node.
///
/// Serves peer reads for the groups of its registry and, as a
/// [`PeerPicker`], routes outbound reads to the peer the ring names as the
/// owner of a key. The ring and the per-peer client table are replaced
/// atomically by [`set_peers`](HttpPool::set_peers) under the pool mutex.
pub struct HttpPool {
    /// This node's base URL, e.g. `http://10.0.0.2:8001`.
    self_url: String,
    base_path: String,
    registry: Arc<Registry>,
    client: Client,
    state: Mutex<PoolState>,
}

struct PoolState {
    ring: HashRing,
    fetchers: HashMap<String, Arc<HttpFetcher>>,
}

impl HttpPool {
    pub fn new(self_url: &str, registry: Arc<Registry>) -> Self {
        Self {
            self_url: self_url.to_owned(),
            base_path: DEFAULT_BASE_PATH.to_owned(),
            registry,
            client: Client::new(),
            state: Mutex::new(PoolState {
                ring: HashRing::new(DEFAULT_REPLICAS),
                fetchers: HashMap::new(),
            }),
        }
    }

    /// Installs the cluster's peer list, rebuilding the ring and the client
    /// table. The list includes this node itself.
    pub fn set_peers<I, S>(&self, peers: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ring = HashRing::new(DEFAULT_REPLICAS);
        let mut fetchers = HashMap::new();
        for peer in peers {
            let peer = peer.as_ref();
            let base = Url::parse(peer)
                .and_then(|url| url.join(&self.base_path))
                .with_context(|| format!("parsing peer url {peer}"))?;
            ring.add([peer]);
            fetchers.insert(
                peer.to_owned(),
                Arc::new(HttpFetcher {
                    base,
                    client: self.client.clone(),
                }),
            );
        }

        let mut state = self.state.lock();
        *state = PoolState { ring, fetchers };
        Ok(())
    }

    /// Builds the router serving peer reads under the pool's base path.
    /// Base-path requests that do not split into a group and a key fall
    /// through to the 400 handler; anything off the base path is not ours.
    pub fn router(&self) -> Router {
        let base = self.base_path.trim_end_matches('/');
        Router::new()
            .route(
                &format!("{base}/:group/:key"),
                get(handlers::handle_group_fetch),
            )
            .fallback(handlers::handle_unmatched)
            .layer(Extension(self.registry.clone()))
    }

    pub fn self_url(&self) -> &str {
        &self.self_url
    }

    /// Snapshot of the configured peer URLs.
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.state.lock().fetchers.keys().cloned().collect();
        peers.sort();
        peers
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>> {
        let state = self.state.lock();
        let owner = state.ring.get(key)?;
        if owner == self.self_url {
            return None;
        }
        tracing::debug!(node = %self.self_url, key, owner, "picked peer");
        let fetcher = state.fetchers.get(owner)?.clone();
        Some(fetcher as Arc<dyn PeerFetcher>)
    }
}

/// HTTP client for one peer.
pub struct HttpFetcher {
    /// The peer's base URL including the pool base path.
    base: Url,
    client: Client,
}

#[async_trait]
impl PeerFetcher for HttpFetcher {
    async fn fetch(&self, group: &str, key: &str) -> Result<Vec<u8>> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("peer base url {} cannot carry a path", self.base))?
            .pop_if_empty()
            .push(group)
            .push(key);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;
        if response.status() != StatusCode::OK {
            bail!("server returned: {}", response.status());
        }

        let body = response.bytes().await.context("reading response body")?;
        Ok(body.to_vec())
    }
}
