//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache instance.
//!
//! # Tasks
//! - Maintenance: expiry sweep, pattern analysis, eviction, preload
//!   execution and hit-rate checks, each on its own interval

mod maintenance;

pub use maintenance::{spawn_maintenance, MaintenanceHandle};
