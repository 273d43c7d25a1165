use parking_lot::Mutex;

use super::lru::LruCache;
use super::view::ByteView;

/// The LRU behind a mutex, sized for one group.
///
/// The inner cache is constructed lazily on the first add, so a group that
/// never populates pays nothing for its cache. Every access goes through
/// the lock; critical sections are in-memory and short.
pub struct GuardedCache {
    capacity: i64,
    inner: Mutex<Option<LruCache<ByteView>>>,
}

impl GuardedCache {
    pub fn new(capacity: i64) -> Self {
        Self {
            capacity,
            inner: Mutex::new(None),
        }
    }

    pub fn add(&self, key: &str, value: ByteView) {
        let mut guard = self.inner.lock();
        let lru = guard.get_or_insert_with(|| LruCache::new(self.capacity, None));
        lru.insert(key, value);
    }

    /// Returns a clone of the cached view. A miss on a never-written cache
    /// does not construct the LRU.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut guard = self.inner.lock();
        guard.as_mut()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn used_bytes(&self) -> i64 {
        self.inner.lock().as_ref().map_or(0, LruCache::used_bytes)
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }
}
