use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use super::loader::Loader;
use super::service::Group;

/// Name to group mapping.
///
/// Groups register at construction under the write lock; lookups take the
/// read lock. The process-global instance is the default wiring; separate
/// instances can be constructed and injected where several independent
/// cache universes must coexist (most usefully in tests).
pub struct Registry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

static GLOBAL: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::new()));

impl Registry {
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<Registry> {
        GLOBAL.clone()
    }

    /// Creates and registers a group.
    ///
    /// # Panics
    ///
    /// Panics if the name is already registered; reusing a name is a wiring
    /// bug, not a runtime condition.
    pub fn add_group(&self, name: &str, cache_bytes: i64, loader: Arc<dyn Loader>) -> Arc<Group> {
        let group = Arc::new(Group::new(name, cache_bytes, loader));
        let mut groups = self.groups.write();
        if groups.contains_key(name) {
            panic!("group {name} already registered");
        }
        groups.insert(name.to_owned(), group.clone());
        group
    }

    pub fn get_group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    /// Snapshot of every registered group, for status reporting.
    pub fn groups(&self) -> Vec<Arc<Group>> {
        self.groups.read().values().cloned().collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates and registers a group in the process-global registry.
pub fn add_group(name: &str, cache_bytes: i64, loader: Arc<dyn Loader>) -> Arc<Group> {
    GLOBAL.add_group(name, cache_bytes, loader)
}

/// Looks up a group in the process-global registry.
pub fn get_group(name: &str) -> Option<Arc<Group>> {
    GLOBAL.get_group(name)
}
