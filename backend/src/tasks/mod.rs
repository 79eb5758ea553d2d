// Background tasks for idle injection and throttle eviction.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, warn};

use crate::constants::{IDLE_TICK_SECS, THROTTLE_SWEEP_INTERVAL_SECS};
use crate::engine::Engine;
use crate::utils::now_epoch_ms;

pub async fn idle_watch_task(engine: Arc<Engine>) {
    let mut interval = time::interval(Duration::from_secs(IDLE_TICK_SECS));
    loop {
        interval.tick().await;
        if let Err(err) = engine.inject_if_idle(now_epoch_ms()).await {
            warn!(%err, "idle injection failed");
        }
    }
}

pub async fn throttle_sweep_task(engine: Arc<Engine>) {
    let mut interval = time::interval(Duration::from_secs(THROTTLE_SWEEP_INTERVAL_SECS));
    // The first tick completes immediately; nothing can be stale yet.
    interval.tick().await;
    loop {
        interval.tick().await;
        let evicted = engine.sweep_throttle(now_epoch_ms()).await;
        debug!(evicted, "throttle sweep finished");
    }
}
