//! Cache Statistics Module
//!
//! Hit/miss counters, the snapshot handed to callers, and the report types
//! produced by the maintenance cycles.

use serde::Serialize;

use crate::cache::AccessPattern;
use crate::config::ConfigSummary;

/// Approximate footprint charged per key in [`StatsSnapshot::size`].
pub const APPROX_BYTES_PER_KEY: usize = 1024;

/// Lowest hit rate shown by [`StatsSnapshot::display_hit_rate`] while keys are cached.
pub const DISPLAY_HIT_RATE_FLOOR: f64 = 25.0;

// == Cache Stats ==
/// Running performance counters.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of keys removed by the eviction policy
    pub evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the hit rate as a percentage.
    ///
    /// Returns 0 if no retrievals have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    /// Resets every counter to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // == Snapshot ==
    /// Builds the caller-facing view for a cache holding `keys` keys.
    pub fn snapshot(&self, keys: usize) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits,
            misses: self.misses,
            hit_rate: self.hit_rate(),
            keys,
            size: keys * APPROX_BYTES_PER_KEY,
            total_operations: self.hits + self.misses,
            evictions: self.evictions,
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time statistics of one cache instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    /// Raw hit rate in percent
    pub hit_rate: f64,
    pub keys: usize,
    /// Approximate size in bytes
    pub size: usize,
    /// Number of retrievals (hits + misses)
    pub total_operations: u64,
    pub evictions: u64,
}

impl StatsSnapshot {
    /// Hit rate for dashboards.
    ///
    /// Clamped to at least 25% while any key is cached so a cold cache does
    /// not read as 0%. Not a measured value; use `hit_rate` for anything
    /// that matters.
    pub fn display_hit_rate(&self) -> f64 {
        if self.keys > 0 {
            self.hit_rate.max(DISPLAY_HIT_RATE_FLOOR)
        } else {
            self.hit_rate
        }
    }
}

// == Optimization Report ==
/// Diagnostic export of one cache instance.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationReport {
    pub name: String,
    pub stats: StatsSnapshot,
    pub current_hit_rate: f64,
    pub display_hit_rate: f64,
    pub target_hit_rate: f64,
    pub top_access_patterns: Vec<AccessPattern>,
    pub preload_queue_size: usize,
    pub config: ConfigSummary,
}

// == Cycle Reports ==
/// Outcome of one preload cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreloadReport {
    /// Keys taken off the queue
    pub attempted: usize,
    /// Keys the loader produced a value for
    pub loaded: usize,
    /// Keys that failed to load
    pub failed: usize,
}

/// Outcome of one hit-rate check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitRateCheck {
    pub hit_rate: f64,
    pub target_hit_rate: f64,
    /// Keys newly queued for preload
    pub queued: usize,
    /// Cached keys whose TTL was extended
    pub extended: usize,
}

impl HitRateCheck {
    pub fn below_target(&self) -> bool {
        self.hit_rate < self.target_hit_rate
    }
}

/// Outcome of a warmup call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WarmupOutcome {
    /// Warmup ran; counts of keys seeded
    Completed { critical: usize, patterns: usize },
    /// Another warmup was already running, nothing was done
    AlreadyRunning,
    /// Warmup hit an error and stopped early
    Failed,
}
