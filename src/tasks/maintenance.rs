//! Maintenance Task
//!
//! One background loop per cache instance driving its five periodic cycles.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::AdaptiveCache;

// == Maintenance Handle ==
/// Controls a running maintenance loop.
///
/// Dropping the handle also stops the loop.
#[derive(Debug)]
pub struct MaintenanceHandle {
    name: String,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MaintenanceHandle {
    /// Name of the cache this loop maintains.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signals the loop to stop and waits for it to finish its current cycle.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            if !err.is_cancelled() {
                warn!("[{}] maintenance task ended abnormally: {}", self.name, err);
            }
        }
    }

    /// Stops the loop immediately without waiting.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns the maintenance loop for `cache`.
///
/// Each cycle has its own interval from the cache configuration: expiry
/// sweep (`check_period`), pattern analysis, optimization, preload
/// execution and hit-rate check. The first run of every cycle happens one
/// full period after spawning. Preloading calls the instance loader, so it
/// runs on the blocking pool.
///
/// Must be called from within a tokio runtime.
pub fn spawn_maintenance(cache: Arc<AdaptiveCache>) -> MaintenanceHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let name = cache.name().to_string();

    let task = tokio::spawn(async move {
        let config = cache.config();
        let mut sweep = ticker(config.check_period);
        let mut analysis = ticker(config.schedule.analysis_interval);
        let mut optimization = ticker(config.schedule.optimization_interval);
        let mut preload = ticker(config.schedule.preload_interval);
        let mut hit_rate = ticker(config.schedule.hit_rate_interval);

        info!(
            "[{}] maintenance started (sweep every {:?})",
            cache.name(),
            config.check_period
        );

        loop {
            tokio::select! {
                _ = sweep.tick() => {
                    cache.sweep_expired();
                }
                _ = analysis.tick() => {
                    cache.analyze_patterns();
                }
                _ = optimization.tick() => {
                    let evicted = cache.optimize();
                    if evicted.is_empty() {
                        debug!("[{}] optimization: under key budget", cache.name());
                    }
                }
                _ = preload.tick() => {
                    run_preload(&cache).await;
                }
                _ = hit_rate.tick() => {
                    cache.check_hit_rate();
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("[{}] maintenance stopped", cache.name());
    });

    MaintenanceHandle {
        name,
        shutdown: shutdown_tx,
        task,
    }
}

fn ticker(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn run_preload(cache: &Arc<AdaptiveCache>) {
    let cache = Arc::clone(cache);
    let name = cache.name().to_string();

    if let Err(err) = tokio::task::spawn_blocking(move || cache.execute_preload()).await {
        warn!("[{}] preload cycle panicked: {}", name, err);
    }
}
