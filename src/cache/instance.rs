//! Adaptive Cache Module
//!
//! A named cache instance: the entry store, access patterns, preload queue
//! and counters behind one lock, plus the maintenance cycles that tune them.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::pattern::eviction_order;
use crate::cache::ttl::{adaptive_ttl, scale_ttl};
use crate::cache::{
    AccessPattern, CacheEntry, CacheLoader, CacheStats, Clock, EntryStore, HitRateCheck,
    NoopLoader, OptimizationReport, PatternAnalysis, PatternTracker, PreloadQueue, PreloadReport,
    StatsSnapshot, SystemClock, WarmupOutcome,
};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Expired keys above this priority are queued for preload by the sweep.
pub const EXPIRY_PRELOAD_PRIORITY: u8 = 70;

/// Keys refreshed per preload cycle.
pub const PRELOAD_BATCH_SIZE: usize = 5;

/// Patterns seeded by warmup after the critical keys.
pub const WARMUP_PATTERN_LIMIT: usize = 30;

/// Statistics given to critical keys so they survive early eviction.
pub const CRITICAL_KEY_FREQUENCY: u64 = 10;
pub const CRITICAL_KEY_PRIORITY: u8 = 90;

/// Hit-rate optimizer: how many keys to queue, and from which priority.
pub const HIT_RATE_PRELOAD_LIMIT: usize = 10;
pub const HIT_RATE_PRELOAD_PRIORITY: u8 = 70;

/// Hit-rate optimizer: which cached keys get a longer TTL, and by how much.
pub const TTL_EXTENSION_MIN_FREQUENCY: u64 = 5;
pub const TTL_EXTENSION_MIN_PRIORITY: u8 = 60;
pub const TTL_EXTENSION_FACTOR: f64 = 1.5;

const REPORT_TOP_PATTERNS: usize = 10;

// == Cache State ==
/// Everything guarded by the instance lock.
#[derive(Debug)]
struct CacheState {
    store: EntryStore,
    patterns: PatternTracker,
    preload_queue: PreloadQueue,
    stats: CacheStats,
}

impl CacheState {
    /// Stores a value without counting it as an access.
    ///
    /// A pattern is still created for keys that have none, so every stored
    /// key stays tracked.
    fn insert_untracked(&mut self, key: &str, value: Value, now_ms: u64, ttl: Duration) -> Result<()> {
        self.store
            .insert(key.to_string(), CacheEntry::new(value, now_ms, ttl))?;
        if self.patterns.get(key).is_none() {
            self.patterns.record_access(key, now_ms);
        }
        Ok(())
    }
}

// == Adaptive Cache ==
/// A self-tuning cache instance.
///
/// All operations are synchronous and safe to call from any thread. The
/// maintenance cycles (`sweep_expired`, `analyze_patterns`, `optimize`,
/// `execute_preload`, `check_hit_rate`) are normally driven by
/// [`spawn_maintenance`](crate::tasks::spawn_maintenance).
pub struct AdaptiveCache {
    name: String,
    config: CacheConfig,
    state: Mutex<CacheState>,
    loader: Arc<dyn CacheLoader>,
    clock: Arc<dyn Clock>,
    warmup_in_progress: AtomicBool,
}

impl fmt::Debug for AdaptiveCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveCache")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl AdaptiveCache {
    // == Constructor ==
    /// Creates an instance after validating its configuration.
    ///
    /// Uses [`NoopLoader`] and [`SystemClock`] until replaced with
    /// [`with_loader`](Self::with_loader) / [`with_clock`](Self::with_clock).
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let state = CacheState {
            store: EntryStore::new(config.max_keys),
            patterns: PatternTracker::new(),
            preload_queue: PreloadQueue::new(config.preload_queue_capacity),
            stats: CacheStats::new(),
        };

        Ok(Self {
            name: name.into(),
            config,
            state: Mutex::new(state),
            loader: Arc::new(NoopLoader),
            clock: Arc::new(SystemClock),
            warmup_in_progress: AtomicBool::new(false),
        })
    }

    pub fn with_loader(mut self, loader: Arc<dyn CacheLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        // A panic elsewhere must not take the cache down with it
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ttl_for(&self, patterns: &PatternTracker, key: &str) -> Duration {
        if self.config.adaptive_ttl_enabled {
            adaptive_ttl(self.config.base_ttl, patterns.get(key))
        } else {
            self.config.base_ttl
        }
    }

    // == Get ==
    /// Returns the value for `key` if it is present and not expired.
    ///
    /// Every call counts as a hit or a miss and is recorded in the key's
    /// access pattern. A miss on a key whose priority exceeded the preload
    /// threshold queues it for preload; an entry that expired on read needs
    /// the same priority as one removed by the expiry sweep.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now_ms();
        let mut state = self.state();

        let live = state
            .store
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone());

        if let Some(value) = live {
            state.stats.record_hit();
            state.patterns.record_access(key, now);
            return Some(value);
        }

        let threshold = if state.store.remove(key).is_some() {
            debug!("[{}] '{}' expired on read", self.name, key);
            EXPIRY_PRELOAD_PRIORITY
        } else {
            self.config.preload_threshold
        };

        let prior = state.patterns.priority(key);
        state.stats.record_miss();
        state.patterns.record_access(key, now);

        if prior.is_some_and(|priority| priority > threshold)
            && state.preload_queue.push(key)
        {
            debug!("[{}] queued '{}' for preload after miss", self.name, key);
        }

        None
    }

    // == Set ==
    /// Stores `value` with the adaptive (or base) TTL.
    ///
    /// Returns false if the store refused the write; the rejection is logged.
    pub fn set(&self, key: impl Into<String>, value: Value) -> bool {
        self.set_or_warn(key.into(), value, None)
    }

    /// Stores `value` with an explicit TTL.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: Value, ttl: Duration) -> bool {
        self.set_or_warn(key.into(), value, Some(ttl))
    }

    fn set_or_warn(&self, key: String, value: Value, ttl: Option<Duration>) -> bool {
        match self.try_set(key.clone(), value, ttl) {
            Ok(()) => true,
            Err(err) => {
                warn!("[{}] set rejected for '{}': {}", self.name, key, err);
                false
            }
        }
    }

    /// Stores `value`, reporting why a write was refused.
    pub fn try_set(&self, key: impl Into<String>, value: Value, ttl: Option<Duration>) -> Result<()> {
        let key = key.into();
        let now = self.clock.now_ms();
        let mut state = self.state();

        let ttl = ttl.unwrap_or_else(|| self.ttl_for(&state.patterns, &key));
        state.store.insert(key.clone(), CacheEntry::new(value, now, ttl))?;
        state.patterns.record_access(&key, now);

        Ok(())
    }

    // == Has ==
    /// Returns true if `key` holds a live entry. Does not touch statistics.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.state().store.contains_live(key, now)
    }

    // == Delete ==
    /// Removes `key` and its access pattern. Returns the number of entries removed.
    pub fn delete(&self, key: &str) -> usize {
        let mut state = self.state();
        state.patterns.remove(key);
        usize::from(state.store.remove(key).is_some())
    }

    // == Invalidate Pattern ==
    /// Removes every key containing `needle`. Returns the number removed.
    pub fn invalidate_pattern(&self, needle: &str) -> usize {
        let mut state = self.state();
        let keys = state.store.keys_containing(needle);

        for key in &keys {
            state.store.remove(key);
            state.patterns.remove(key);
        }

        if !keys.is_empty() {
            info!(
                "[{}] invalidated {} keys matching '{}'",
                self.name,
                keys.len(),
                needle
            );
        }
        keys.len()
    }

    // == Flush ==
    /// Removes all entries, patterns and queued preloads. Counters are kept.
    pub fn flush(&self) {
        let mut state = self.state();
        state.store.clear();
        state.patterns.clear();
        state.preload_queue.clear();
        info!("[{}] flushed", self.name);
    }

    /// Resets the hit/miss/eviction counters. Cached data is kept.
    pub fn flush_stats(&self) {
        self.state().stats.reset();
    }

    // == Introspection ==
    /// Number of stored keys, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.state().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().store.is_empty()
    }

    pub fn access_pattern(&self, key: &str) -> Option<AccessPattern> {
        self.state().patterns.get(key).cloned()
    }

    pub fn preload_queue_len(&self) -> usize {
        self.state().preload_queue.len()
    }

    /// Returns true if `key` is waiting in the preload queue.
    pub fn is_queued_for_preload(&self, key: &str) -> bool {
        self.state().preload_queue.contains(key)
    }

    // == Adaptive TTL ==
    /// TTL a `set` of `key` without an explicit TTL would use right now.
    pub fn calculate_adaptive_ttl(&self, key: &str) -> Duration {
        let state = self.state();
        self.ttl_for(&state.patterns, key)
    }

    // == Stats ==
    pub fn stats(&self) -> StatsSnapshot {
        let state = self.state();
        state.stats.snapshot(state.store.len())
    }

    /// Diagnostic export of counters, top patterns and configuration.
    pub fn optimization_report(&self) -> OptimizationReport {
        let state = self.state();
        let stats = state.stats.snapshot(state.store.len());

        OptimizationReport {
            name: self.name.clone(),
            current_hit_rate: stats.hit_rate,
            display_hit_rate: stats.display_hit_rate(),
            target_hit_rate: self.config.target_hit_rate,
            top_access_patterns: state.patterns.top_by_priority(REPORT_TOP_PATTERNS, None),
            preload_queue_size: state.preload_queue.len(),
            config: self.config.summary(),
            stats,
        }
    }

    // == Expiry Sweep ==
    /// Removes expired entries. High-priority ones are queued for preload
    /// first. Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut state = self.state();
        let expired = state.store.expired_keys(now);

        let mut queued = 0;
        for key in &expired {
            if state
                .patterns
                .priority(key)
                .is_some_and(|priority| priority > EXPIRY_PRELOAD_PRIORITY)
                && state.preload_queue.push(key)
            {
                queued += 1;
            }
            state.store.remove(key);
        }

        if expired.is_empty() {
            debug!("[{}] expiry sweep: no expired entries found", self.name);
        } else {
            info!(
                "[{}] expiry sweep: removed {} expired entries, queued {} for preload",
                self.name,
                expired.len(),
                queued
            );
        }
        expired.len()
    }

    // == Pattern Analysis ==
    /// Buckets patterns by priority and purges stale ones. Patterns of
    /// stored keys are kept.
    pub fn analyze_patterns(&self) -> PatternAnalysis {
        let now = self.clock.now_ms();
        let mut guard = self.state();
        let state = &mut *guard;
        let analysis = state
            .patterns
            .analyze(now, |key| state.store.get(key).is_some());
        drop(guard);

        debug!(
            "[{}] pattern analysis: high={} medium={} low={} purged={}",
            self.name, analysis.high, analysis.medium, analysis.low, analysis.purged
        );
        analysis
    }

    // == Optimize ==
    /// Evicts the lowest-priority tenth of `max_keys` once the store is more
    /// than 80% full. Returns the evicted keys.
    pub fn optimize(&self) -> Vec<String> {
        let mut state = self.state();
        let max_keys = state.store.max_keys();

        if state.store.len() * 10 <= max_keys * 8 {
            return Vec::new();
        }

        let mut ranked: Vec<AccessPattern> = state
            .store
            .keys()
            .map(|key| {
                state
                    .patterns
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| AccessPattern::seeded(key.as_str(), 0, 0, 0))
            })
            .collect();
        ranked.sort_by(eviction_order);

        let batch = (max_keys / 10).max(1);
        let evicted: Vec<String> = ranked.into_iter().take(batch).map(|p| p.key).collect();

        for key in &evicted {
            state.store.remove(key);
            state.patterns.remove(key);
        }
        state.stats.record_evictions(evicted.len());

        info!(
            "[{}] evicted {} low-priority keys ({} remain of {})",
            self.name,
            evicted.len(),
            state.store.len(),
            max_keys
        );
        evicted
    }

    // == Preload ==
    /// Loads `key` through the instance loader and stores the result.
    ///
    /// Returns whether a value was stored. Preloading is not counted as an
    /// access.
    pub fn preload_key(&self, key: &str) -> Result<bool> {
        self.store_loaded(key, self.loader.load(key))
    }

    /// Like [`preload_key`](Self::preload_key), but the loader runs on the
    /// blocking pool so a slow fetch does not stall the runtime.
    async fn preload_key_blocking(&self, key: &str) -> Result<bool> {
        let loader = Arc::clone(&self.loader);
        let owned_key = key.to_string();

        let loaded = tokio::task::spawn_blocking(move || loader.load(&owned_key))
            .await
            .map_err(|err| CacheError::Preload {
                key: key.to_string(),
                reason: format!("loader task failed: {}", err),
            })?;
        self.store_loaded(key, loaded)
    }

    fn store_loaded(&self, key: &str, loaded: anyhow::Result<Option<Value>>) -> Result<bool> {
        let loaded = loaded.map_err(|err| CacheError::Preload {
            key: key.to_string(),
            reason: format!("{:#}", err),
        })?;

        let Some(value) = loaded else {
            return Ok(false);
        };

        let now = self.clock.now_ms();
        let mut state = self.state();
        let ttl = self.ttl_for(&state.patterns, key);
        state.insert_untracked(key, value, now, ttl)?;
        Ok(true)
    }

    /// Takes up to five keys off the preload queue and loads them.
    ///
    /// Failures are logged and not retried in the same cycle.
    pub fn execute_preload(&self) -> PreloadReport {
        let batch = self.state().preload_queue.drain_batch(PRELOAD_BATCH_SIZE);
        let mut report = PreloadReport {
            attempted: batch.len(),
            ..PreloadReport::default()
        };

        for key in &batch {
            match self.preload_key(key) {
                Ok(true) => report.loaded += 1,
                Ok(false) => debug!("[{}] nothing to preload for '{}'", self.name, key),
                Err(err) => {
                    warn!("[{}] {}", self.name, err);
                    report.failed += 1;
                }
            }
        }

        if report.attempted > 0 {
            info!(
                "[{}] preload: attempted={} loaded={} failed={}",
                self.name, report.attempted, report.loaded, report.failed
            );
        }
        report
    }

    // == Hit-Rate Optimizer ==
    /// Compares the hit rate with the target and, when below it, queues the
    /// hottest keys for preload and extends the TTL of frequently used
    /// cached keys.
    pub fn check_hit_rate(&self) -> HitRateCheck {
        let now = self.clock.now_ms();
        let mut state = self.state();
        let mut check = HitRateCheck {
            hit_rate: state.stats.hit_rate(),
            target_hit_rate: self.config.target_hit_rate,
            queued: 0,
            extended: 0,
        };

        if !check.below_target() {
            return check;
        }

        let hottest = state
            .patterns
            .top_by_priority(HIT_RATE_PRELOAD_LIMIT, Some(HIT_RATE_PRELOAD_PRIORITY));
        for pattern in &hottest {
            if state.preload_queue.push(&pattern.key) {
                check.queued += 1;
            }
        }

        let extendable: Vec<(String, Value)> = state
            .patterns
            .iter()
            .filter(|p| {
                p.frequency > TTL_EXTENSION_MIN_FREQUENCY && p.priority > TTL_EXTENSION_MIN_PRIORITY
            })
            .filter_map(|p| {
                state
                    .store
                    .get(&p.key)
                    .filter(|entry| !entry.is_expired(now))
                    .map(|entry| (p.key.clone(), entry.value.clone()))
            })
            .collect();

        for (key, value) in extendable {
            let ttl = scale_ttl(self.ttl_for(&state.patterns, &key), TTL_EXTENSION_FACTOR);
            if state.insert_untracked(&key, value, now, ttl).is_ok() {
                check.extended += 1;
            }
        }

        info!(
            "[{}] hit rate {:.1}% below target {:.1}%: queued {} for preload, extended {} TTLs",
            self.name, check.hit_rate, check.target_hit_rate, check.queued, check.extended
        );
        check
    }

    // == Warmup ==
    /// Seeds critical keys, then the most frequently used uncached keys.
    ///
    /// Returns immediately with [`WarmupOutcome::AlreadyRunning`] if another
    /// warmup of this instance is in progress. Errors are logged, never
    /// returned.
    pub async fn warmup_cache(&self) -> WarmupOutcome {
        if self
            .warmup_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("[{}] warmup already in progress", self.name);
            return WarmupOutcome::AlreadyRunning;
        }
        let _guard = WarmupGuard(&self.warmup_in_progress);

        info!("[{}] warmup started", self.name);
        match self.run_warmup().await {
            Ok((critical, patterns)) => {
                info!(
                    "[{}] warmup complete: {} critical keys, {} pattern keys",
                    self.name, critical, patterns
                );
                WarmupOutcome::Completed { critical, patterns }
            }
            Err(err) => {
                error!("[{}] warmup failed: {}", self.name, err);
                WarmupOutcome::Failed
            }
        }
    }

    /// Returns true while a warmup of this instance is running.
    pub fn is_warming_up(&self) -> bool {
        self.warmup_in_progress.load(Ordering::Acquire)
    }

    async fn run_warmup(&self) -> Result<(usize, usize)> {
        let mut critical = 0;
        for key in &self.config.critical_keys {
            if self.has(key) {
                continue;
            }

            let value = self.loader.default_value(key);
            {
                let now = self.clock.now_ms();
                let mut state = self.state();
                state
                    .store
                    .insert(key.clone(), CacheEntry::new(value, now, self.config.base_ttl))?;
                state.patterns.insert(AccessPattern::seeded(
                    key.as_str(),
                    now,
                    CRITICAL_KEY_FREQUENCY,
                    CRITICAL_KEY_PRIORITY,
                ));
            }
            critical += 1;
            tokio::task::yield_now().await;
        }

        let candidates: Vec<String> = {
            let now = self.clock.now_ms();
            let state = self.state();
            state
                .patterns
                .top_by_frequency(state.patterns.len())
                .into_iter()
                .filter(|p| !state.store.contains_live(&p.key, now))
                .take(WARMUP_PATTERN_LIMIT)
                .map(|p| p.key)
                .collect()
        };

        let mut seeded = 0;
        for key in &candidates {
            match self.preload_key_blocking(key).await {
                Ok(true) => seeded += 1,
                Ok(false) => {}
                Err(err) => warn!("[{}] warmup: {}", self.name, err),
            }
        }

        Ok((critical, seeded))
    }
}

/// Clears the warmup flag when dropped, whatever way the warmup ended.
struct WarmupGuard<'a>(&'a AtomicBool);

impl Drop for WarmupGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
