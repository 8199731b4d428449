//! Access Pattern Module
//!
//! Per-key access statistics and the priority score derived from them.
//! Patterns may outlive their cache entries so that recently valuable keys
//! can still be preloaded after they expire.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

/// Patterns untouched for this long become candidates for purging.
pub const STALE_PATTERN_AGE_MS: u64 = 24 * 60 * 60 * 1000;

/// Stale patterns below this priority are purged during analysis.
pub const STALE_PATTERN_PRIORITY: u8 = 30;

/// Priorities above this are bucketed as high.
pub const HIGH_PRIORITY: u8 = 80;

/// Priorities above this (and up to [`HIGH_PRIORITY`]) are bucketed as medium.
pub const MEDIUM_PRIORITY: u8 = 50;

const MS_PER_MINUTE: f64 = 60_000.0;

// == Access Pattern ==
/// Access statistics for a single key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessPattern {
    pub key: String,
    /// Number of observed accesses (sets, hits and misses)
    pub frequency: u64,
    /// Timestamp of the latest access (Unix milliseconds)
    pub last_access: u64,
    /// Smoothed time between accesses in milliseconds, 0 until a second access
    pub avg_access_interval_ms: u64,
    /// Derived 0-100 score
    pub priority: u8,
}

impl AccessPattern {
    /// Creates the pattern for a key's first observed access.
    pub fn new(key: impl Into<String>, now_ms: u64) -> Self {
        let mut pattern = Self {
            key: key.into(),
            frequency: 1,
            last_access: now_ms,
            avg_access_interval_ms: 0,
            priority: 0,
        };
        pattern.priority = pattern.priority_at(now_ms);
        pattern
    }

    /// Creates a pattern with fixed statistics, used to protect seeded keys.
    pub fn seeded(key: impl Into<String>, now_ms: u64, frequency: u64, priority: u8) -> Self {
        Self {
            key: key.into(),
            frequency,
            last_access: now_ms,
            avg_access_interval_ms: 0,
            priority: priority.min(100),
        }
    }

    // == Record ==
    /// Folds one more access at `now_ms` into the statistics.
    pub fn record(&mut self, now_ms: u64) {
        let interval = now_ms.saturating_sub(self.last_access);

        self.frequency += 1;
        self.avg_access_interval_ms = (self.avg_access_interval_ms + interval) / 2;
        self.last_access = now_ms;
        self.priority = self.priority_at(now_ms);
    }

    // == Priority ==
    /// Scores the pattern as seen at `now_ms`.
    ///
    /// Rounded mean of three 0-100 scores: recency (minus one point per
    /// minute idle), frequency (two points per access) and interval (minus
    /// one point per minute between accesses, 50 with no interval yet).
    pub fn priority_at(&self, now_ms: u64) -> u8 {
        let idle_minutes = now_ms.saturating_sub(self.last_access) as f64 / MS_PER_MINUTE;
        let recency = (100.0 - idle_minutes).max(0.0);

        let frequency = (self.frequency as f64 * 2.0).min(100.0);

        let interval = if self.avg_access_interval_ms > 0 {
            (100.0 - self.avg_access_interval_ms as f64 / MS_PER_MINUTE).max(0.0)
        } else {
            50.0
        };

        ((recency + frequency + interval) / 3.0).round().clamp(0.0, 100.0) as u8
    }

    /// Returns true if the pattern is old and weak enough to forget.
    pub fn is_stale(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_access) > STALE_PATTERN_AGE_MS
            && self.priority_at(now_ms) < STALE_PATTERN_PRIORITY
    }
}

// == Pattern Analysis ==
/// Outcome of one analysis pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatternAnalysis {
    /// Patterns with priority above 80
    pub high: usize,
    /// Patterns with priority 51 to 80
    pub medium: usize,
    /// Patterns with priority 50 or below
    pub low: usize,
    /// Stale patterns removed by this pass
    pub purged: usize,
}

// == Pattern Tracker ==
/// Table of access patterns keyed by cache key.
#[derive(Debug, Default)]
pub struct PatternTracker {
    patterns: HashMap<String, AccessPattern>,
}

impl PatternTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Access ==
    /// Records an access to `key`, creating its pattern if needed.
    pub fn record_access(&mut self, key: &str, now_ms: u64) -> &AccessPattern {
        self.patterns
            .entry(key.to_string())
            .and_modify(|pattern| pattern.record(now_ms))
            .or_insert_with(|| AccessPattern::new(key, now_ms))
    }

    pub fn get(&self, key: &str) -> Option<&AccessPattern> {
        self.patterns.get(key)
    }

    /// Returns the stored priority for `key`, or `None` if it was never seen.
    pub fn priority(&self, key: &str) -> Option<u8> {
        self.patterns.get(key).map(|pattern| pattern.priority)
    }

    /// Inserts or replaces a pattern.
    pub fn insert(&mut self, pattern: AccessPattern) {
        self.patterns.insert(pattern.key.clone(), pattern);
    }

    pub fn remove(&mut self, key: &str) -> Option<AccessPattern> {
        self.patterns.remove(key)
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessPattern> {
        self.patterns.values()
    }

    // == Analyze ==
    /// Buckets patterns by priority, then purges stale ones.
    ///
    /// Patterns for which `is_stored` returns true are never purged, so a
    /// long-lived entry keeps its statistics.
    pub fn analyze(&mut self, now_ms: u64, is_stored: impl Fn(&str) -> bool) -> PatternAnalysis {
        let mut analysis = PatternAnalysis::default();

        for pattern in self.patterns.values() {
            match pattern.priority {
                p if p > HIGH_PRIORITY => analysis.high += 1,
                p if p > MEDIUM_PRIORITY => analysis.medium += 1,
                _ => analysis.low += 1,
            }
        }

        let before = self.patterns.len();
        self.patterns
            .retain(|key, pattern| is_stored(key) || !pattern.is_stale(now_ms));
        analysis.purged = before - self.patterns.len();

        analysis
    }

    // == Top By Priority ==
    /// Returns up to `limit` patterns with priority above `min_priority`,
    /// highest first.
    pub fn top_by_priority(&self, limit: usize, min_priority: Option<u8>) -> Vec<AccessPattern> {
        let mut candidates: Vec<&AccessPattern> = self
            .patterns
            .values()
            .filter(|p| min_priority.map_or(true, |min| p.priority > min))
            .collect();

        candidates.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| a.key.cmp(&b.key))
        });
        candidates.into_iter().take(limit).cloned().collect()
    }

    // == Top By Frequency ==
    /// Returns up to `limit` patterns, most frequently accessed first.
    pub fn top_by_frequency(&self, limit: usize) -> Vec<AccessPattern> {
        let mut candidates: Vec<&AccessPattern> = self.patterns.values().collect();

        candidates.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| b.priority.cmp(&a.priority))
                .then_with(|| a.key.cmp(&b.key))
        });
        candidates.into_iter().take(limit).cloned().collect()
    }
}

/// Orders keys from least to most valuable for eviction.
///
/// Lower priority first; ties go to the key accessed longest ago.
pub fn eviction_order(a: &AccessPattern, b: &AccessPattern) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| a.last_access.cmp(&b.last_access))
        .then_with(|| a.key.cmp(&b.key))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: u64 = 60_000;

    #[test]
    fn test_first_access_scores() {
        let pattern = AccessPattern::new("k", 0);

        assert_eq!(pattern.frequency, 1);
        assert_eq!(pattern.avg_access_interval_ms, 0);
        // (100 recency + 2 frequency + 50 neutral interval) / 3
        assert_eq!(pattern.priority, 51);
    }

    #[test]
    fn test_record_smooths_interval() {
        let mut pattern = AccessPattern::new("k", 0);

        pattern.record(MINUTE);
        assert_eq!(pattern.frequency, 2);
        assert_eq!(pattern.avg_access_interval_ms, 30_000);
        assert_eq!(pattern.last_access, MINUTE);
        // (100 + 4 + 99.5) / 3 = 67.83
        assert_eq!(pattern.priority, 68);

        pattern.record(2 * MINUTE);
        assert_eq!(pattern.avg_access_interval_ms, 45_000);
    }

    #[test]
    fn test_priority_monotonic_in_frequency() {
        let mut low = AccessPattern::new("low", 0);
        let mut high = AccessPattern::new("high", 0);
        low.record(0);
        for _ in 0..10 {
            high.record(0);
        }

        assert!(high.priority >= low.priority);
    }

    #[test]
    fn test_priority_decays_with_idle_time() {
        let pattern = AccessPattern::new("k", 0);

        let fresh = pattern.priority_at(0);
        let idle = pattern.priority_at(90 * MINUTE);
        assert!(idle < fresh);
    }

    #[test]
    fn test_frequency_score_caps_at_100() {
        let mut pattern = AccessPattern::new("k", 0);
        for _ in 0..200 {
            pattern.record(0);
        }
        // (100 + 100 + 50) / 3
        assert_eq!(pattern.priority, 83);
    }

    #[test]
    fn test_analyze_buckets_and_purges_stale() {
        let mut tracker = PatternTracker::new();
        tracker.insert(AccessPattern::seeded("hot", 0, 10, 90));
        tracker.insert(AccessPattern::seeded("warm", 0, 3, 60));
        tracker.record_access("cold", 0);

        let day_later = STALE_PATTERN_AGE_MS + MINUTE;
        let analysis = tracker.analyze(day_later, |_| false);

        assert_eq!(analysis.high, 1);
        assert_eq!(analysis.medium, 2);
        assert_eq!(analysis.low, 0);
        // Every pattern has been idle for a day, so all decay below 30
        assert_eq!(analysis.purged, 3);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_analyze_keeps_recent_patterns() {
        let mut tracker = PatternTracker::new();
        tracker.record_access("recent", 0);

        let analysis = tracker.analyze(MINUTE, |_| false);
        assert_eq!(analysis.purged, 0);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_analyze_keeps_stale_patterns_of_stored_keys() {
        let mut tracker = PatternTracker::new();
        tracker.record_access("stored", 0);
        tracker.record_access("gone", 0);

        let analysis = tracker.analyze(STALE_PATTERN_AGE_MS + MINUTE, |key| key == "stored");
        assert_eq!(analysis.purged, 1);
        assert!(tracker.get("stored").is_some());
        assert!(tracker.get("gone").is_none());
    }

    #[test]
    fn test_top_by_priority_filters_and_orders() {
        let mut tracker = PatternTracker::new();
        tracker.insert(AccessPattern::seeded("a", 0, 1, 95));
        tracker.insert(AccessPattern::seeded("b", 0, 1, 72));
        tracker.insert(AccessPattern::seeded("c", 0, 1, 40));

        let top = tracker.top_by_priority(10, Some(70));
        let keys: Vec<&str> = top.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_top_by_frequency_limit() {
        let mut tracker = PatternTracker::new();
        for (key, freq) in [("a", 3), ("b", 9), ("c", 5)] {
            tracker.insert(AccessPattern::seeded(key, 0, freq, 50));
        }

        let top = tracker.top_by_frequency(2);
        let keys: Vec<&str> = top.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_eviction_order_prefers_low_priority_then_oldest() {
        let a = AccessPattern::seeded("a", 100, 1, 40);
        let b = AccessPattern::seeded("b", 50, 1, 40);
        let c = AccessPattern::seeded("c", 0, 1, 90);

        let mut patterns = vec![c.clone(), a.clone(), b.clone()];
        patterns.sort_by(eviction_order);
        let keys: Vec<&str> = patterns.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}
