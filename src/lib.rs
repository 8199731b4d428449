//! Adaptive Cache - a self-tuning in-process cache
//!
//! Named cache instances with adaptive TTLs, access-pattern tracking,
//! priority eviction, preloading and warmup, plus an admin HTTP surface.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{AdaptiveCache, CacheLoader, CacheRegistry};
pub use config::{CacheConfig, Config};
pub use tasks::{spawn_maintenance, MaintenanceHandle};
