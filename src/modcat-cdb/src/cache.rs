//! Query result cache.
//!
//! A plain key/value map owned by the repository instance: no TTL, no
//! eviction. The catalog is static between refreshes, so entries are only
//! ever invalidated wholesale via [`QueryCache::clear`] when the catalog is
//! replaced.

use std::collections::HashMap;
use std::sync::Arc;

use modcat::NormalizedMod;

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<String, Arc<Vec<NormalizedMod>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<NormalizedMod>>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: String, value: Vec<NormalizedMod>) -> Arc<Vec<NormalizedMod>> {
        let value = Arc::new(value);
        self.entries.insert(key, Arc::clone(&value));
        value
    }

    /// Drop every cached result. Called on catalog refresh.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
