//! Preload Module
//!
//! The queue of keys waiting to be refreshed, and the loader strategy that
//! materializes them.

use std::collections::{HashSet, VecDeque};

use serde_json::{json, Value};

// == Cache Loader ==
/// Data source used to refresh and seed a cache instance.
///
/// Each owning subsystem supplies its own loader; the cache itself knows
/// nothing about what its keys mean.
pub trait CacheLoader: Send + Sync {
    /// Fetches a fresh value for `key`.
    ///
    /// `Ok(None)` means there is nothing to materialize for this key.
    fn load(&self, key: &str) -> anyhow::Result<Option<Value>>;

    /// Produces the value stored for a critical key during warmup.
    fn default_value(&self, key: &str) -> Value;
}

// == Noop Loader ==
/// Loader that never fetches anything and seeds placeholder values.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLoader;

impl CacheLoader for NoopLoader {
    fn load(&self, _key: &str) -> anyhow::Result<Option<Value>> {
        Ok(None)
    }

    fn default_value(&self, key: &str) -> Value {
        json!({ "key": key, "warmed": true })
    }
}

// == Preload Queue ==
/// Bounded, deduplicated FIFO of keys to preload.
#[derive(Debug)]
pub struct PreloadQueue {
    order: VecDeque<String>,
    queued: HashSet<String>,
    capacity: usize,
}

impl PreloadQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            queued: HashSet::new(),
            capacity,
        }
    }

    // == Push ==
    /// Queues `key` unless it is already queued or the queue is full.
    ///
    /// Returns true if the key was added.
    pub fn push(&mut self, key: &str) -> bool {
        if self.queued.contains(key) || self.order.len() >= self.capacity {
            return false;
        }
        self.queued.insert(key.to_string());
        self.order.push_back(key.to_string());
        true
    }

    // == Drain Batch ==
    /// Removes and returns up to `limit` keys in insertion order.
    pub fn drain_batch(&mut self, limit: usize) -> Vec<String> {
        let take = limit.min(self.order.len());
        let batch: Vec<String> = self.order.drain(..take).collect();
        for key in &batch {
            self.queued.remove(key);
        }
        batch
    }

    pub fn contains(&self, key: &str) -> bool {
        self.queued.contains(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.queued.clear();
    }
}
