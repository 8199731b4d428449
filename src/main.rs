//! Adaptive Cache - demo server
//!
//! Hosts the standard cache instances and exposes their admin endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use serde_json::{json, Value};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adaptive_cache::api::create_router;
use adaptive_cache::cache::{AdaptiveCache, CacheLoader, CacheRegistry};
use adaptive_cache::config::{CacheConfig, Config};
use adaptive_cache::tasks::MaintenanceHandle;
use adaptive_cache::AppState;

/// Loader for a subsystem without a backing fetch yet.
///
/// Preloads nothing; warmup seeds a marker value.
struct SubsystemLoader {
    subsystem: &'static str,
}

impl CacheLoader for SubsystemLoader {
    fn load(&self, _key: &str) -> anyhow::Result<Option<Value>> {
        Ok(None)
    }

    fn default_value(&self, key: &str) -> Value {
        json!({
            "subsystem": self.subsystem,
            "key": key,
            "status": "warm",
            "seeded_at": chrono::Utc::now().to_rfc3339(),
        })
    }
}

/// Builds the `database`, `api`, `health` and `session` instances.
fn build_registry(config: &Config) -> anyhow::Result<CacheRegistry> {
    let instances = [
        ("database", CacheConfig::database(), vec!["db:connection_pool", "db:schema_version"]),
        ("api", CacheConfig::api(), vec!["/api/health", "/api/status"]),
        ("health", CacheConfig::health(), vec!["health:database", "health:services"]),
        ("session", CacheConfig::session(), vec![]),
    ];

    let mut registry = CacheRegistry::new();
    for (name, cache_config, critical_keys) in instances {
        let cache_config = cache_config
            .with_critical_keys(critical_keys)
            .with_target_hit_rate(config.target_hit_rate);
        let cache = AdaptiveCache::new(name, cache_config)
            .with_context(|| format!("invalid configuration for cache '{}'", name))?
            .with_loader(Arc::new(SubsystemLoader { subsystem: name }));
        registry.register(cache)?;
    }
    Ok(registry)
}

/// Main entry point for the adaptive cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the named cache instances
/// 4. Start their maintenance loops and optionally warm them
/// 5. Serve the admin router until SIGINT/SIGTERM
/// 6. Stop the maintenance loops
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adaptive_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Adaptive Cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, warmup_on_start={}, target_hit_rate={}%",
        config.server_port, config.warmup_on_start, config.target_hit_rate
    );

    let registry = build_registry(&config)?;
    info!("Cache instances initialized: {:?}", registry.names());

    let maintenance = registry.spawn_maintenance();
    info!("Maintenance loops started");

    if config.warmup_on_start {
        for (name, outcome) in registry.warmup_all().await {
            info!("Warmup of '{}': {:?}", name, outcome);
        }
    }

    let app = create_router(AppState::new(registry));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    stop_maintenance(maintenance).await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}

async fn stop_maintenance(handles: Vec<MaintenanceHandle>) {
    for handle in handles {
        let name = handle.name().to_string();
        handle.shutdown().await;
        info!("Maintenance of '{}' stopped", name);
    }
}
