//! Maintenance ticker — the single periodic driver of the cleanup cycle.

use std::sync::Arc;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::manager::PoolShared;

// ---

/// Spawn the maintenance loop.
///
/// One sweep per `idle_session_check_interval`; the first fires a full
/// interval after startup, matching the cadence of a ticker armed at
/// construction. Missed ticks are skipped rather than replayed, so a
/// stalled runtime cannot queue up a burst of sweeps. The task exits when
/// the manager is cancelled.
pub(crate) fn spawn(shared: Arc<PoolShared>) {
    // ---
    tokio::spawn(async move {
        let period = shared.config().idle_session_check_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shared.cancelled() => break,
                _ = ticker.tick() => Arc::clone(&shared).maintain().await,
            }
        }
    });
}
