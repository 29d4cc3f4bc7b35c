//! Background eviction of expired counters

use super::store::WindowedCounterStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Shortest period the sweeper will tick at
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Sweep `store` every `every` until `cancel` fires
///
/// Runs independently of request traffic; memory stays bounded by the number
/// of keys active within one window. Periods below `MIN_SWEEP_INTERVAL` are
/// raised to it.
pub fn spawn_sweeper(
    store: Arc<WindowedCounterStore>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let every = if every < MIN_SWEEP_INTERVAL {
        warn!(requested = ?every, "Sweep interval too short, using {:?}", MIN_SWEEP_INTERVAL);
        MIN_SWEEP_INTERVAL
    } else {
        every
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Rate limit sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let evicted = store.sweep();
                    if evicted > 0 {
                        debug!(evicted, remaining = store.len(), "Swept expired rate limit counters");
                    }
                }
            }
        }
    })
}
