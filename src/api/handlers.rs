//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{CacheRegistry, OptimizationReport, WarmupOutcome};
use crate::error::{CacheError, Result};
use crate::models::{
    CachesResponse, DeleteResponse, GetResponse, HealthResponse, InvalidateResponse,
    MessageResponse, SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The registry is immutable once built; each cache does its own locking.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CacheRegistry>,
}

impl AppState {
    /// Creates a new AppState around the given registry.
    pub fn new(registry: CacheRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

/// Handler for GET /caches
pub async fn list_caches_handler(State(state): State<AppState>) -> Json<CachesResponse> {
    Json(CachesResponse {
        caches: state.registry.names(),
    })
}

/// Handler for PUT /caches/:name/set
///
/// Stores a JSON value with an optional TTL in seconds.
pub async fn set_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let cache = state.registry.require(&name)?;
    cache.try_set(req.key.clone(), req.value, req.ttl.map(Duration::from_secs))?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /caches/:name/get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    let cache = state.registry.require(&name)?;
    let value = cache
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /caches/:name/del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    let cache = state.registry.require(&name)?;
    let removed = cache.delete(&key);

    Ok(Json(DeleteResponse::new(key, removed)))
}

/// Handler for DELETE /caches/:name/invalidate/:pattern
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path((name, pattern)): Path<(String, String)>,
) -> Result<Json<InvalidateResponse>> {
    let cache = state.registry.require(&name)?;
    let removed = cache.invalidate_pattern(&pattern);

    Ok(Json(InvalidateResponse::new(pattern, removed)))
}

/// Handler for GET /caches/:name/stats
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatsResponse>> {
    let cache = state.registry.require(&name)?;
    Ok(Json(StatsResponse::new(name, cache.stats())))
}

/// Handler for GET /caches/:name/report
pub async fn report_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<OptimizationReport>> {
    let cache = state.registry.require(&name)?;
    Ok(Json(cache.optimization_report()))
}

/// Handler for POST /caches/:name/warmup
pub async fn warmup_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<WarmupOutcome>> {
    let cache = state.registry.require(&name)?;
    Ok(Json(cache.warmup_cache().await))
}

/// Handler for POST /caches/:name/flush
pub async fn flush_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>> {
    let cache = state.registry.require(&name)?;
    cache.flush();
    Ok(Json(MessageResponse::new(format!("Cache '{}' flushed", name))))
}

/// Handler for POST /caches/:name/flush-stats
pub async fn flush_stats_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>> {
    let cache = state.registry.require(&name)?;
    cache.flush_stats();
    Ok(Json(MessageResponse::new(format!(
        "Statistics of cache '{}' reset",
        name
    ))))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
