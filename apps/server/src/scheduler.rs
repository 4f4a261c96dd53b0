//! Background sweeper for the gateway caches.
//!
//! Reads already ignore expired entries; this only keeps memory bounded by
//! dropping entries that are past the stale grace window.

use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::main_lib::AppState;

/// Starts the periodic cache sweep.
pub fn start_cache_sweeper(state: Arc<AppState>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        info!("Cache sweeper started ({:?} interval)", every);

        let mut sweep_interval = interval(every);
        sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick is immediate and there is nothing to sweep yet
        sweep_interval.tick().await;

        loop {
            sweep_interval.tick().await;
            run_sweep(&state);
        }
    })
}

fn run_sweep(state: &AppState) {
    let removed = state.gateway.sweep_caches();
    if removed > 0 {
        info!("Cache sweep evicted {} entries", removed);
    } else {
        debug!("Cache sweep found nothing to evict");
    }
}
