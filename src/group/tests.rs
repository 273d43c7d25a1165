use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::flight::FlightGroup;
use super::loader::{FnLoader, Loader};
use super::registry::{self, Registry};
use crate::cache::view::ByteView;
use crate::peers::picker::{PeerFetcher, PeerPicker};

fn scores_db() -> HashMap<&'static str, &'static str> {
    HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")])
}

/// Loader over the static scores table that counts invocations per key.
fn counting_loader(counts: Arc<dashmap::DashMap<String, usize>>) -> Arc<dyn Loader> {
    Arc::new(FnLoader(move |key: &str| {
        *counts.entry(key.to_owned()).or_insert(0) += 1;
        scores_db()
            .get(key)
            .map(|value| value.as_bytes().to_vec())
            .ok_or_else(|| anyhow!("{key} not found"))
    }))
}

#[tokio::test]
async fn get_reads_through_and_then_hits_cache() {
    let counts = Arc::new(dashmap::DashMap::new());
    let registry = Registry::new();
    let group = registry.add_group("scores", 2 << 10, counting_loader(counts.clone()));

    for (key, want) in scores_db() {
        let view = group.get(key).await.expect("known key loads");
        assert_eq!(view.to_vec(), want.as_bytes());
        assert_eq!(*counts.get(key).expect("loader ran"), 1, "loader miss for {key}");

        // Second read must come from the cache.
        let view = group.get(key).await.expect("cached key hits");
        assert_eq!(view.to_vec(), want.as_bytes());
        assert_eq!(*counts.get(key).expect("loader ran"), 1, "cache miss for {key}");
    }

    assert_eq!(group.cache_entries(), scores_db().len());
}

#[tokio::test]
async fn loader_errors_propagate_and_are_not_cached() {
    let counts = Arc::new(dashmap::DashMap::new());
    let registry = Registry::new();
    let group = registry.add_group("scores", 2 << 10, counting_loader(counts.clone()));

    let err = group.get("unknown").await.expect_err("unknown key fails");
    assert!(err.to_string().contains("unknown not found"));

    // No negative caching: the loader runs again for the same bad key.
    group.get("unknown").await.expect_err("still fails");
    assert_eq!(*counts.get("unknown").expect("loader ran"), 2);
}

#[tokio::test]
async fn empty_key_is_rejected() {
    let registry = Registry::new();
    let group = registry.add_group("scores", 2 << 10, counting_loader(Arc::default()));

    let err = group.get("").await.expect_err("empty key fails");
    assert!(err.to_string().contains("key is required"));
}

#[tokio::test]
#[should_panic(expected = "already registered")]
async fn duplicate_group_names_are_rejected() {
    let registry = Registry::new();
    registry.add_group("dup", 1024, counting_loader(Arc::default()));
    registry.add_group("dup", 1024, counting_loader(Arc::default()));
}

#[tokio::test]
#[should_panic(expected = "register_peers called more than once")]
async fn double_peer_registration_is_rejected() {
    let registry = Registry::new();
    let group = registry.add_group("wired", 1024, counting_loader(Arc::default()));

    group.register_peers(Arc::new(NoPeers));
    group.register_peers(Arc::new(NoPeers));
}

#[tokio::test]
async fn global_registry_round_trips() {
    let group = registry::add_group("global-scores", 1024, counting_loader(Arc::default()));
    let found = registry::get_group("global-scores").expect("registered group resolves");
    assert_eq!(found.name(), group.name());
    assert!(registry::get_group("absent").is_none());
}

#[tokio::test]
async fn peer_failure_falls_back_to_loader() {
    let counts = Arc::new(dashmap::DashMap::new());
    let registry = Registry::new();
    let group = registry.add_group("scores", 2 << 10, counting_loader(counts.clone()));
    group.register_peers(Arc::new(AlwaysFailingPeer));

    let view = group.get("Tom").await.expect("falls back to loader");
    assert_eq!(view.to_vec(), b"630");
    assert_eq!(*counts.get("Tom").expect("loader ran"), 1);
}

#[tokio::test]
async fn concurrent_gets_invoke_loader_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let loader_calls = calls.clone();
    let registry = Registry::new();
    let group = registry.add_group(
        "slow",
        2 << 10,
        Arc::new(SlowLoader {
            calls: loader_calls,
        }),
    );

    let mut handles = Vec::new();
    for _ in 0..10 {
        let group = group.clone();
        handles.push(tokio::spawn(async move {
            group.get("Tom").await.expect("load succeeds").to_vec()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.expect("task completes"), b"630");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn flight_group_coalesces_and_then_forgets() {
    let flight: Arc<FlightGroup<ByteView>> = Arc::new(FlightGroup::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let flight = flight.clone();
        let calls = calls.clone();
        handles.push(tokio::spawn(async move {
            flight
                .run("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(ByteView::new(b"v".to_vec()))
                })
                .await
                .expect("work succeeds")
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.expect("task completes").to_vec(), b"v");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(flight.in_flight(), 0);

    // The record is gone, so a later call recomputes.
    flight
        .run("k", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(ByteView::new(b"v2".to_vec()))
        })
        .await
        .expect("work succeeds");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn flight_group_shares_errors_with_every_waiter() {
    let flight: Arc<FlightGroup<ByteView>> = Arc::new(FlightGroup::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let flight = flight.clone();
        let calls = calls.clone();
        handles.push(tokio::spawn(async move {
            flight
                .run("bad", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Err(anyhow!("source offline"))
                })
                .await
        }));
    }
    for handle in handles {
        let err = handle.await.expect("task completes").expect_err("shared failure");
        assert!(err.to_string().contains("source offline"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

struct NoPeers;

impl PeerPicker for NoPeers {
    fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerFetcher>> {
        None
    }
}

struct AlwaysFailingPeer;

impl PeerPicker for AlwaysFailingPeer {
    fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerFetcher>> {
        Some(Arc::new(AlwaysFailingPeer))
    }
}

#[async_trait]
impl PeerFetcher for AlwaysFailingPeer {
    async fn fetch(&self, _group: &str, _key: &str) -> Result<Vec<u8>> {
        Err(anyhow!("peer unreachable"))
    }
}

struct SlowLoader {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Loader for SlowLoader {
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        match key {
            "Tom" => Ok(b"630".to_vec()),
            _ => Err(anyhow!("{key} not found")),
        }
    }
}
