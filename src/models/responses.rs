//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::StatsSnapshot;

/// Response body for GET /caches/:name/get/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: Value,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for PUT /caches/:name/set
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for DELETE /caches/:name/del/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// The key that was deleted
    pub key: String,
    /// Number of entries removed (0 or 1)
    pub removed: usize,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, removed: usize) -> Self {
        Self {
            key: key.into(),
            removed,
        }
    }
}

/// Response body for DELETE /caches/:name/invalidate/:pattern
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Substring matched against keys
    pub pattern: String,
    /// Number of keys removed
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(pattern: impl Into<String>, removed: usize) -> Self {
        Self {
            pattern: pattern.into(),
            removed,
        }
    }
}

/// Response body for GET /caches/:name/stats
///
/// Carries the raw counters plus the floored hit rate meant for dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Cache instance name
    pub name: String,
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    /// Hit rate with the cold-start display floor applied
    pub display_hit_rate: f64,
}

impl StatsResponse {
    pub fn new(name: impl Into<String>, stats: StatsSnapshot) -> Self {
        Self {
            name: name.into(),
            display_hit_rate: stats.display_hit_rate(),
            stats,
        }
    }
}

/// Response body for GET /caches
#[derive(Debug, Clone, Serialize)]
pub struct CachesResponse {
    pub caches: Vec<String>,
}

/// Response body for flush operations
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
