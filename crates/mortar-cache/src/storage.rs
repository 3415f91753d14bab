#![forbid(unsafe_code)]

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::namespace::CacheNamespace;

/// Registry of named cache namespaces.
///
/// Mirrors the platform cache-storage surface: `open` creates on demand,
/// `names` enumerates, `delete` drops a whole namespace. Activation uses
/// these to evict every orphaned namespace after a version bump.
#[derive(Clone, Default)]
pub struct CacheStorage {
    inner: Arc<RwLock<HashMap<String, CacheNamespace>>>,
}

impl std::fmt::Debug for CacheStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStorage")
            .field("namespaces", &self.inner.read().len())
            .finish()
    }
}

impl CacheStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a namespace, creating it if absent. Returns a shared handle:
    /// all opens of the same name see the same entries.
    #[must_use]
    pub fn open(&self, name: &str) -> CacheNamespace {
        if let Some(ns) = self.inner.read().get(name) {
            return ns.clone();
        }
        let mut guard = self.inner.write();
        guard
            .entry(name.to_string())
            .or_insert_with(|| CacheNamespace::new(name))
            .clone()
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    /// All namespace names, unordered.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    /// Delete a namespace and everything in it. Returns whether it existed.
    pub fn delete(&self, name: &str) -> bool {
        self.inner.write().remove(name).is_some()
    }
}
