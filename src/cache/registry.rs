//! Cache Registry Module
//!
//! Holds the named cache instances of a process. Instances are independent;
//! the registry only owns and looks them up.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::{AdaptiveCache, WarmupOutcome};
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_maintenance, MaintenanceHandle};

// == Cache Registry ==
/// Named cache instances, e.g. `database`, `api`, `health`, `session`.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    caches: BTreeMap<String, Arc<AdaptiveCache>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Adds an instance under its own name.
    ///
    /// Fails if the name is already taken.
    pub fn register(&mut self, cache: AdaptiveCache) -> Result<Arc<AdaptiveCache>> {
        let name = cache.name().to_string();
        if self.caches.contains_key(&name) {
            return Err(CacheError::InvalidConfig(format!(
                "cache '{}' is already registered",
                name
            )));
        }

        let cache = Arc::new(cache);
        self.caches.insert(name, Arc::clone(&cache));
        Ok(cache)
    }

    pub fn get(&self, name: &str) -> Option<Arc<AdaptiveCache>> {
        self.caches.get(name).cloned()
    }

    /// Like [`get`](Self::get), but an unknown name is an error.
    pub fn require(&self, name: &str) -> Result<Arc<AdaptiveCache>> {
        self.get(name)
            .ok_or_else(|| CacheError::UnknownCache(name.to_string()))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.caches.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AdaptiveCache>> {
        self.caches.values()
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    // == Maintenance ==
    /// Starts the maintenance loop of every instance.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_maintenance(&self) -> Vec<MaintenanceHandle> {
        self.caches
            .values()
            .map(|cache| spawn_maintenance(Arc::clone(cache)))
            .collect()
    }

    /// Warms every instance in turn.
    pub async fn warmup_all(&self) -> Vec<(String, WarmupOutcome)> {
        let mut outcomes = Vec::with_capacity(self.caches.len());
        for (name, cache) in &self.caches {
            outcomes.push((name.clone(), cache.warmup_cache().await));
        }
        outcomes
    }
}
