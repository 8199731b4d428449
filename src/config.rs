//! Configuration Module
//!
//! Per-instance cache configuration, the standard instance presets, and the
//! process configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use serde::Serialize;

use crate::error::{CacheError, Result};

// == Maintenance Schedule ==
/// Intervals of the background maintenance cycles.
///
/// The expiry sweep runs on [`CacheConfig::check_period`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceSchedule {
    pub analysis_interval: Duration,
    pub optimization_interval: Duration,
    pub preload_interval: Duration,
    pub hit_rate_interval: Duration,
}

impl Default for MaintenanceSchedule {
    fn default() -> Self {
        Self {
            analysis_interval: Duration::from_secs(30),
            optimization_interval: Duration::from_secs(120),
            preload_interval: Duration::from_secs(300),
            hit_rate_interval: Duration::from_secs(60),
        }
    }
}

impl MaintenanceSchedule {
    /// Runs every cycle at the same interval. Handy for tests and demos.
    pub fn uniform(interval: Duration) -> Self {
        Self {
            analysis_interval: interval,
            optimization_interval: interval,
            preload_interval: interval,
            hit_rate_interval: interval,
        }
    }
}

// == Cache Config ==
/// Immutable configuration of one cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL used when no explicit or adaptive TTL applies
    pub base_ttl: Duration,
    /// Interval of the expiry sweep
    pub check_period: Duration,
    /// Hard ceiling on stored keys
    pub max_keys: usize,
    /// Derive TTLs from access statistics when the caller gives none
    pub adaptive_ttl_enabled: bool,
    /// Keys seeded by warmup
    pub critical_keys: Vec<String>,
    /// Hit rate (percent) below which the optimizer intervenes
    pub target_hit_rate: f64,
    /// Misses on keys with a priority above this are queued for preload
    pub preload_threshold: u8,
    /// Maximum number of queued preload keys
    pub preload_queue_capacity: usize,
    pub schedule: MaintenanceSchedule,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_ttl: Duration::from_secs(300),
            check_period: Duration::from_secs(60),
            max_keys: 1000,
            adaptive_ttl_enabled: true,
            critical_keys: Vec::new(),
            target_hit_rate: 85.0,
            preload_threshold: 50,
            preload_queue_capacity: 100,
            schedule: MaintenanceSchedule::default(),
        }
    }
}

impl CacheConfig {
    // == Presets ==
    /// Query result cache: 5 minute TTL, 1000 keys.
    pub fn database() -> Self {
        Self::default()
    }

    /// API response cache: 1 minute TTL, 500 keys.
    pub fn api() -> Self {
        Self {
            base_ttl: Duration::from_secs(60),
            check_period: Duration::from_secs(30),
            max_keys: 500,
            ..Self::default()
        }
    }

    /// Health check cache: 5 minute TTL, 500 keys, fixed TTLs.
    pub fn health() -> Self {
        Self {
            max_keys: 500,
            adaptive_ttl_enabled: false,
            ..Self::default()
        }
    }

    /// Session cache: 30 minute TTL, 2000 keys.
    pub fn session() -> Self {
        Self {
            base_ttl: Duration::from_secs(1800),
            max_keys: 2000,
            ..Self::default()
        }
    }

    // == Builders ==
    pub fn with_base_ttl(mut self, ttl: Duration) -> Self {
        self.base_ttl = ttl;
        self
    }

    pub fn with_check_period(mut self, period: Duration) -> Self {
        self.check_period = period;
        self
    }

    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }

    pub fn with_adaptive_ttl(mut self, enabled: bool) -> Self {
        self.adaptive_ttl_enabled = enabled;
        self
    }

    pub fn with_critical_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.critical_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_target_hit_rate(mut self, target: f64) -> Self {
        self.target_hit_rate = target;
        self
    }

    pub fn with_schedule(mut self, schedule: MaintenanceSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    // == Validate ==
    /// Rejects configurations the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_keys == 0 {
            return Err(CacheError::InvalidConfig(
                "max_keys must be greater than zero".to_string(),
            ));
        }
        if self.base_ttl.is_zero() {
            return Err(CacheError::InvalidConfig(
                "base_ttl must be greater than zero".to_string(),
            ));
        }
        if self.preload_queue_capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "preload_queue_capacity must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.target_hit_rate) {
            return Err(CacheError::InvalidConfig(format!(
                "target_hit_rate must be within 0..=100, got {}",
                self.target_hit_rate
            )));
        }

        let periods = [
            ("check_period", self.check_period),
            ("analysis_interval", self.schedule.analysis_interval),
            ("optimization_interval", self.schedule.optimization_interval),
            ("preload_interval", self.schedule.preload_interval),
            ("hit_rate_interval", self.schedule.hit_rate_interval),
        ];
        for (name, period) in periods {
            if period.is_zero() {
                return Err(CacheError::InvalidConfig(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Flattens the config for reports.
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            base_ttl_secs: self.base_ttl.as_secs_f64(),
            check_period_secs: self.check_period.as_secs_f64(),
            max_keys: self.max_keys,
            adaptive_ttl_enabled: self.adaptive_ttl_enabled,
            critical_keys: self.critical_keys.clone(),
        }
    }
}

/// Serializable view of a [`CacheConfig`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSummary {
    pub base_ttl_secs: f64,
    pub check_period_secs: f64,
    pub max_keys: usize,
    pub adaptive_ttl_enabled: bool,
    pub critical_keys: Vec<String>,
}

// == Process Config ==
/// Process configuration for the demo server.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port of the admin surface
    pub server_port: u16,
    /// Run warmup on every instance at startup
    pub warmup_on_start: bool,
    /// Target hit rate applied to every instance
    pub target_hit_rate: f64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - Admin HTTP port (default: 3000)
    /// - `WARMUP_ON_START` - Warm caches at startup (default: true)
    /// - `TARGET_HIT_RATE` - Target hit rate in percent (default: 85)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            warmup_on_start: env::var("WARMUP_ON_START")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.warmup_on_start),
            target_hit_rate: env::var("TARGET_HIT_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.target_hit_rate),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            warmup_on_start: true,
            target_hit_rate: 85.0,
        }
    }
}
