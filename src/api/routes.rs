//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, flush_handler, flush_stats_handler, get_handler, health_handler,
    invalidate_handler, list_caches_handler, report_handler, set_handler, stats_handler,
    warmup_handler, AppState,
};

/// Creates the admin router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/caches", get(list_caches_handler))
        .route("/caches/:name/stats", get(stats_handler))
        .route("/caches/:name/report", get(report_handler))
        .route("/caches/:name/get/:key", get(get_handler))
        .route("/caches/:name/set", put(set_handler))
        .route("/caches/:name/del/:key", delete(delete_handler))
        .route("/caches/:name/invalidate/:pattern", delete(invalidate_handler))
        .route("/caches/:name/warmup", post(warmup_handler))
        .route("/caches/:name/flush", post(flush_handler))
        .route("/caches/:name/flush-stats", post(flush_stats_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
