//! API Module
//!
//! Admin and diagnostics HTTP surface over the named cache instances.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /caches` - List cache instances
//! - `GET /caches/:name/stats` - Counters of one instance
//! - `GET /caches/:name/report` - Optimization report of one instance
//! - `GET /caches/:name/get/:key` - Retrieve a value by key
//! - `PUT /caches/:name/set` - Store a key-value pair
//! - `DELETE /caches/:name/del/:key` - Delete a key
//! - `DELETE /caches/:name/invalidate/:pattern` - Delete keys containing a substring
//! - `POST /caches/:name/warmup` - Run warmup
//! - `POST /caches/:name/flush` - Drop all entries and patterns
//! - `POST /caches/:name/flush-stats` - Reset counters

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
