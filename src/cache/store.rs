//! Entry Store Module
//!
//! Bounded key -> entry map. Holds no policy: expiry decisions, eviction and
//! statistics live in the owning [`AdaptiveCache`](crate::cache::AdaptiveCache).

use std::collections::HashMap;

use crate::cache::{CacheEntry, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

// == Entry Store ==
/// Key-value storage with a hard key-count ceiling.
#[derive(Debug)]
pub struct EntryStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Maximum number of keys accepted
    max_keys: usize,
}

impl EntryStore {
    // == Constructor ==
    /// Creates an empty store that accepts at most `max_keys` keys.
    pub fn new(max_keys: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_keys,
        }
    }

    // == Insert ==
    /// Stores an entry, replacing any previous entry for the key.
    ///
    /// Overwrites always succeed. A new key is rejected with
    /// [`CacheError::CacheFull`] once the store holds `max_keys` keys.
    pub fn insert(&mut self, key: String, entry: CacheEntry) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_keys {
            return Err(CacheError::CacheFull(format!(
                "key limit of {} reached",
                self.max_keys
            )));
        }

        self.entries.insert(key, entry);
        Ok(())
    }

    // == Get ==
    /// Returns the entry for `key`, expired or not.
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Contains Live ==
    /// Returns true if `key` is stored and not expired at `now_ms`.
    pub fn contains_live(&self, key: &str, now_ms: u64) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired(now_ms))
            .unwrap_or(false)
    }

    // == Remove ==
    /// Removes and returns the entry for `key`.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    // == Expired Keys ==
    /// Lists every key whose entry has expired at `now_ms`.
    pub fn expired_keys(&self, now_ms: u64) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now_ms))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Keys Containing ==
    /// Lists every key that contains `needle` as a substring.
    pub fn keys_containing(&self, needle: &str) -> Vec<String> {
        self.entries
            .keys()
            .filter(|key| key.contains(needle))
            .cloned()
            .collect()
    }

    /// Iterates over all stored keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of stored keys, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the key ceiling.
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }
}
