//! [`PooledSession`] — a dialed session plus the bookkeeping the pool needs.
//!
//! The transport implementation behind [`AnyTlsSessionPtr`] knows nothing
//! about pooling. This wrapper carries the manager-assigned sequence
//! number, the creation and idle timestamps the maintenance sweep reads,
//! and the one-shot sentinel that keeps the death hook from running twice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ---

use tokio::sync::watch;
use tokio::time::Instant;

// ---

use anytls_domain::{AnyTlsSessionPtr, AnyTlsStreamPtr, Result};

// ---------------------------------------------------------------------------
// PooledSession
// ---------------------------------------------------------------------------

pub(crate) struct PooledSession {
    // ---
    /// Manager-assigned sequence number. Unique and strictly increasing
    /// for the lifetime of one manager.
    seq: u64,

    /// Instant of successful dial. Immutable; age rotation reads it.
    created_at: Instant,

    /// Instant of the most recent transition into the idle pool. Only
    /// meaningful while the session sits in the pool; written under the
    /// idle-pool lock.
    idle_since: Mutex<Instant>,

    transport: AnyTlsSessionPtr,

    /// One-shot sentinel for the death hook. The explicit close path and
    /// the spontaneous-death watcher can both reach the hook; whichever
    /// swaps this first runs it.
    hook_fired: AtomicBool,
}

// ---

impl PooledSession {
    // ---

    pub(crate) fn new(seq: u64, transport: AnyTlsSessionPtr, now: Instant) -> Self {
        // ---
        Self {
            seq,
            created_at: now,
            idle_since: Mutex::new(now),
            transport,
            hook_fired: AtomicBool::new(false),
        }
    }

    // ---

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    pub(crate) fn created_at(&self) -> Instant {
        self.created_at
    }

    pub(crate) fn idle_since(&self) -> Instant {
        *self.idle_since.lock().unwrap()
    }

    /// Stamp the session as idle as of `now`. Caller holds the idle-pool
    /// lock (insertion and lease renewal both happen under it).
    pub(crate) fn touch_idle(&self, now: Instant) {
        *self.idle_since.lock().unwrap() = now;
    }

    // ---

    pub(crate) fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }

    pub(crate) fn closed_rx(&self) -> watch::Receiver<bool> {
        self.transport.closed_rx()
    }

    pub(crate) async fn open_stream(&self) -> Result<AnyTlsStreamPtr> {
        self.transport.open_stream().await
    }

    pub(crate) async fn close_transport(&self) -> Result<()> {
        self.transport.close().await
    }

    /// Start the transport's protocol loop. Called once, after registration.
    pub(crate) fn start(&self) {
        self.transport.run();
    }

    // ---

    /// Claim the death hook. Returns true exactly once; later callers see
    /// the hook as already taken.
    pub(crate) fn take_death_hook(&self) -> bool {
        !self.hook_fired.swap(true, Ordering::SeqCst)
    }

    // ---

    /// Effective lifetime for age rotation: `max` plus a deterministic
    /// per-session offset in `[-jitter, +jitter)` derived from `seq`.
    ///
    /// The offset is computed in whole seconds (`seq mod 2·jitter_secs`),
    /// so the same session always computes the same expiry and independent
    /// ticks agree without storing anything. No RNG on the sweep path.
    /// Sub-second jitter rounds down to zero and disables itself.
    pub(crate) fn effective_lifetime(&self, max: Duration, jitter: Duration) -> Duration {
        // ---
        let jitter_secs = jitter.as_secs();
        if jitter_secs == 0 {
            return max;
        }
        let offset = self.seq % (jitter_secs * 2);
        max - jitter + Duration::from_secs(offset)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
