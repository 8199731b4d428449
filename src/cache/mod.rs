//! Cache Module
//!
//! Self-tuning in-memory caching: TTL expiry, access-pattern tracking,
//! adaptive TTLs, priority eviction and proactive preloading.

mod clock;
mod entry;
mod instance;
pub mod pattern;
mod preload;
mod registry;
mod stats;
mod store;
pub mod ttl;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use instance::AdaptiveCache;
pub use pattern::{AccessPattern, PatternAnalysis, PatternTracker};
pub use preload::{CacheLoader, NoopLoader, PreloadQueue};
pub use registry::CacheRegistry;
pub use stats::{
    CacheStats, HitRateCheck, OptimizationReport, PreloadReport, StatsSnapshot, WarmupOutcome,
};
pub use store::EntryStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
