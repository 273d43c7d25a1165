use anyhow::Result;
use async_trait::async_trait;

/// Source of truth behind a group.
///
/// Invoked exactly when a key misses the local cache and no remote peer can
/// serve it: no peers are configured, the ring routes the key to this node,
/// or the peer fetch failed. Errors propagate to the caller unchanged and
/// are never cached.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, key: &str) -> Result<Vec<u8>>;
}

/// Adapts a plain function into a [`Loader`], so call sites may pass either
/// a closure or a capability-bearing object.
pub struct FnLoader<F>(pub F);

#[async_trait]
impl<F> Loader for FnLoader<F>
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        (self.0)(key)
    }
}
