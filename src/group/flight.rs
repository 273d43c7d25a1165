use std::sync::Arc;

use anyhow::{Result, anyhow};
use dashmap::DashMap;
use tokio::sync::OnceCell;

/// Completed outcome of an in-flight call, shareable across every waiter.
type Outcome<T> = std::result::Result<T, Arc<anyhow::Error>>;

/// Coalesces concurrent work for identical keys.
///
/// For any set of concurrent [`run`](FlightGroup::run) calls with the same
/// key, the work closure runs exactly once and every caller receives the
/// same outcome. The in-flight record is removed once the call completes,
/// so later invocations observe fresh results.
pub struct FlightGroup<T> {
    calls: DashMap<String, Arc<OnceCell<Outcome<T>>>>,
}

impl<T> Default for FlightGroup<T> {
    fn default() -> Self {
        Self {
            calls: DashMap::new(),
        }
    }
}

impl<T: Clone> FlightGroup<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        // Every concurrent caller for the key lands on the same cell; the
        // first to initialize it runs the work, the rest await completion.
        let cell = self.calls.entry(key.to_owned()).or_default().clone();
        let outcome = cell
            .get_or_init(|| async { work().await.map_err(Arc::new) })
            .await
            .clone();

        // Drop the record so the next burst recomputes, but never remove a
        // newer in-flight call that replaced this one.
        self.calls.remove_if(key, |_, entry| Arc::ptr_eq(entry, &cell));

        outcome.map_err(|e| anyhow!("{e:#}"))
    }

    /// Number of calls currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.len()
    }
}
