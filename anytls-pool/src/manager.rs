//! [`PoolManager`] — multiplexes streams onto a pool of long-lived sessions.
//!
//! # Request path
//!
//! ```text
//! acquire_stream
//!     │  pop newest idle ──────────────┐
//!     │  (or dial a fresh session)     │
//!     ▼                                ▼
//! session.open_stream ──► PooledStream ──► caller
//!                              │ drop
//!                              ▼
//!                    back into the idle pool
//!                    (or torn down, see stream.rs)
//! ```
//!
//! # Maintenance path
//!
//! A single ticker fires every `idle_session_check_interval` and runs one
//! sweep: idle-timeout closes and age-rotation closes are decided in one
//! newest-first pass under the idle-pool lock, each with its own
//! independent retention floor; the marked sessions are closed after the
//! lock is released; finally up to `ensure_idle_session_create_rate`
//! background creators are spawned to refill the pool toward
//! `ensure_idle_session`.
//!
//! # Lock discipline
//!
//! Two mutexes: the idle pool and the session registry. Neither is ever
//! held across an await or while the other is held — every path takes them
//! one at a time, for O(pool) traversals or O(1) mutations only. The
//! sequence counter is a bare atomic so the hot path needs no lock for
//! identity.
//!
//! Methods on [`PoolShared`] that hand themselves to background tasks take
//! `self: Arc<Self>`; the handle type clones its `Arc` at each call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ---

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// ---

use anytls_domain::{AnyTlsError, Result, SessionDialerPtr};

// ---

use crate::config::PoolConfig;
use crate::idle_pool::IdlePool;
use crate::registry::SessionRegistry;
use crate::session::PooledSession;
use crate::stream::PooledStream;
use crate::ticker;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Dial budget for one proactive creator. Deliberately detached from the
/// manager's cancellation and from any caller context — maintenance must
/// not be starved by a caller going away mid-tick.
const PROACTIVE_DIAL_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// PoolManager
// ---------------------------------------------------------------------------

/// Client-side session pool for one remote endpoint.
///
/// Owns the idle pool, the session registry, and the maintenance ticker.
/// Dropping the manager cancels its background tasks; [`close`](Self::close)
/// additionally tears down every registered session.
pub struct PoolManager {
    // ---
    shared: Arc<PoolShared>,
}

// ---

impl PoolManager {
    // ---

    /// Build a manager and start its maintenance ticker.
    ///
    /// `parent` bounds the manager's lifetime: cancelling it stops
    /// acquisitions and background work the same way [`close`](Self::close)
    /// does, minus the eager teardown of registered sessions. The config is
    /// normalized here, so callers may pass the raw merge result.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(parent: &CancellationToken, dialer: SessionDialerPtr, config: PoolConfig) -> Self {
        // ---
        let shared = Arc::new(PoolShared {
            config: config.normalized(),
            dialer,
            cancel: parent.child_token(),
            seq: AtomicU64::new(0),
            idle: Mutex::new(IdlePool::new()),
            registry: SessionRegistry::new(),
        });

        ticker::spawn(Arc::clone(&shared));
        Self { shared }
    }

    // ---

    /// Check out one stream, reusing the newest idle session when there is
    /// one and dialing a fresh session otherwise.
    ///
    /// Fails with [`AnyTlsError::PoolClosed`] once the manager is
    /// cancelled. A dial failure surfaces as
    /// [`AnyTlsError::CreateSession`]; a session that comes up but cannot
    /// open a stream is closed and the failure surfaces as
    /// [`AnyTlsError::CreateStream`].
    pub async fn acquire_stream(&self) -> Result<PooledStream> {
        Arc::clone(&self.shared).acquire_stream().await
    }

    // ---

    /// Shut the pool down: refuse further acquisitions, then close every
    /// registered session. Idempotent.
    pub async fn close(&self) -> Result<()> {
        // ---
        self.shared.cancel.cancel();

        // Snapshot-and-empty under the registry lock, close outside it.
        let sessions = self.shared.registry.drain();
        for session in sessions {
            self.shared.close_session(&session).await;
        }
        Ok(())
    }
}

// ---

impl Drop for PoolManager {
    // ---
    fn drop(&mut self) {
        // Stops the ticker and future acquisitions even when the caller
        // never reached close(). Registered sessions die with their
        // transports.
        self.shared.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// PoolShared
// ---------------------------------------------------------------------------

/// State shared between the manager handle, the ticker, the per-session
/// death watchers, and every checked-out [`PooledStream`].
pub(crate) struct PoolShared {
    // ---
    config: PoolConfig,
    dialer: SessionDialerPtr,
    cancel: CancellationToken,

    /// Monotonic session counter; the next session gets `seq + 1`.
    seq: AtomicU64,

    idle: Mutex<IdlePool>,
    registry: SessionRegistry,
}

// ---

impl PoolShared {
    // ---

    pub(crate) fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub(crate) async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    // ---

    async fn acquire_stream(self: Arc<Self>) -> Result<PooledStream> {
        // ---
        if self.cancel.is_cancelled() {
            return Err(AnyTlsError::PoolClosed);
        }

        let session = match self.pop_idle() {
            Some(session) => session,
            None => Arc::clone(&self)
                .create_session()
                .await
                .map_err(|e| AnyTlsError::CreateSession(e.to_string()))?,
        };

        match session.open_stream().await {
            Ok(stream) => Ok(PooledStream::new(stream, session, self)),
            Err(e) => {
                // The session is unusable — tear it down rather than letting
                // the pool hand it out again.
                self.close_session(&session).await;
                Err(AnyTlsError::CreateStream(e.to_string()))
            }
        }
    }

    // ---

    fn pop_idle(&self) -> Option<Arc<PooledSession>> {
        self.idle.lock().unwrap().pop_newest()
    }

    // ---

    /// Return hook for a finished stream. Invoked from
    /// [`PooledStream`]'s drop.
    pub(crate) fn return_session(self: Arc<Self>, session: Arc<PooledSession>) {
        // ---
        if session.is_closed() {
            // The session's own death hook owns cleanup.
            return;
        }

        if self.cancel.is_cancelled() {
            // Pool is frozen — tear the session down instead of pooling it.
            tokio::spawn(async move {
                self.close_session(&session).await;
            });
            return;
        }

        let mut idle = self.idle.lock().unwrap();
        session.touch_idle(Instant::now());
        idle.insert(session);
    }

    // ---

    /// Dial, wrap, number, register, watch, start. Shared by the on-demand
    /// and proactive creation paths.
    async fn create_session(self: Arc<Self>) -> Result<Arc<PooledSession>> {
        // ---
        let transport = self.dialer.dial().await?;

        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let session = Arc::new(PooledSession::new(seq, transport, Instant::now()));

        self.registry.insert(seq, Arc::clone(&session));
        Arc::clone(&self).spawn_death_watch(Arc::clone(&session));
        session.start();
        Ok(session)
    }

    // ---

    /// Watch for the transport dying underneath us — peer reset, TLS alert,
    /// keepalive failure — and run the death hook when it does. The
    /// explicit-close path runs the hook inline instead; the sentinel
    /// inside the session keeps the two routes from both running it.
    fn spawn_death_watch(self: Arc<Self>, session: Arc<PooledSession>) {
        // ---
        let mut closed_rx = session.closed_rx();
        tokio::spawn(async move {
            // Err means the transport dropped its sender — death either way.
            let _ = closed_rx.wait_for(|closed| *closed).await;
            self.run_death_hook(&session);
        });
    }

    // ---

    /// Session death hook: remove from the idle pool, then from the
    /// registry. Runs at most once per session.
    fn run_death_hook(&self, session: &PooledSession) {
        // ---
        if !session.take_death_hook() {
            return;
        }
        self.idle.lock().unwrap().remove(session.seq());
        self.registry.remove(session.seq());
    }

    // ---

    /// Close a session's transport and run its death hook inline, so the
    /// caller observes the session gone from both structures on return.
    pub(crate) async fn close_session(&self, session: &PooledSession) {
        // ---
        if let Err(e) = session.close_transport().await {
            tracing::debug!(seq = session.seq(), error = %e, "session close reported an error");
        }
        self.run_death_hook(session);
    }

    // ---

    /// One maintenance sweep. Phases 1–2 run under the idle-pool lock:
    /// every idle session is visited newest-first and the idle-timeout and
    /// age-rotation decisions are made against that single consistent view,
    /// each policy with its own retention floor. Phase 3 — closing the
    /// marked sessions and refilling the pool — runs after the lock is
    /// released.
    pub(crate) async fn maintain(self: Arc<Self>) {
        // ---
        let now = Instant::now();
        let cfg = &self.config;

        let mut idle_to_close: Vec<Arc<PooledSession>> = Vec::new();
        let mut age_to_close: Vec<Arc<PooledSession>> = Vec::new();
        let mut idle_retained = 0usize;
        let mut age_retained = 0usize;

        let current_pool_size = {
            let mut idle = self.idle.lock().unwrap();

            idle.retain(|session| {
                let mut close_idle = false;

                // Idle-timeout decision. Newest-first iteration means the
                // first (newest) timed-out sessions soak up the retention
                // floor; a spared session gets a fresh lease so it is not
                // re-judged against a stale timestamp next tick.
                if now.duration_since(session.idle_since()) > cfg.idle_session_timeout {
                    if idle_retained >= cfg.min_idle_session {
                        close_idle = true;
                    } else {
                        session.touch_idle(now);
                        idle_retained += 1;
                    }
                } else {
                    idle_retained += 1;
                }

                // Age decision. Only sessions that would have been closed
                // but were spared consume protection slots — a session
                // still within its lifetime costs nothing.
                let mut close_age = false;
                if !cfg.max_connection_lifetime.is_zero() && !close_idle {
                    let lifetime = session.effective_lifetime(
                        cfg.max_connection_lifetime,
                        cfg.connection_lifetime_jitter,
                    );
                    if now.duration_since(session.created_at()) > lifetime {
                        if age_retained >= cfg.min_idle_session_for_age {
                            close_age = true;
                        } else {
                            age_retained += 1;
                        }
                    }
                }

                if close_idle {
                    idle_to_close.push(Arc::clone(session));
                    false
                } else if close_age {
                    age_to_close.push(Arc::clone(session));
                    false
                } else {
                    true
                }
            });

            idle.len()
        };

        if !idle_to_close.is_empty() {
            tracing::debug!(
                found = current_pool_size + idle_to_close.len(),
                closing = idle_to_close.len(),
                protected = idle_retained,
                "idle session cleanup"
            );
        }
        if !age_to_close.is_empty() {
            tracing::debug!(
                closing = age_to_close.len(),
                protected = age_retained,
                "age-based session cleanup"
            );
        }

        // The marked sessions are already out of the pool, so their death
        // hooks run without contending with the sweep.
        for session in idle_to_close.iter().chain(age_to_close.iter()) {
            self.close_session(session).await;
        }

        self.replenish(current_pool_size);
    }

    // ---

    /// Spawn enough background creators to bring the idle pool back toward
    /// `ensure_idle_session`, bounded per tick by
    /// `ensure_idle_session_create_rate`. Creators outlive the tick; a
    /// failed dial is logged and rediscovered as deficit next tick.
    fn replenish(self: Arc<Self>, current_pool_size: usize) {
        // ---
        let cfg = &self.config;
        if cfg.ensure_idle_session == 0 {
            return;
        }
        let deficit = cfg.ensure_idle_session.saturating_sub(current_pool_size);
        if deficit == 0 {
            return;
        }

        let mut to_create = deficit;
        if cfg.ensure_idle_session_create_rate > 0 {
            to_create = to_create.min(cfg.ensure_idle_session_create_rate);
        }

        tracing::debug!(
            current = current_pool_size,
            target = cfg.ensure_idle_session,
            to_create,
            "proactive pool maintenance"
        );

        for _ in 0..to_create {
            let shared = Arc::clone(&self);
            tokio::spawn(async move {
                // Fresh dial budget, independent of the manager's token: a
                // shutdown that lands mid-dial is handled after the dial
                // resolves.
                let dialed = tokio::time::timeout(
                    PROACTIVE_DIAL_TIMEOUT,
                    Arc::clone(&shared).create_session(),
                )
                .await;
                let session = match dialed {
                    Ok(Ok(session)) => session,
                    Ok(Err(e)) => {
                        tracing::debug!(error = %e, "failed to create proactive session");
                        return;
                    }
                    Err(_) => {
                        tracing::debug!("proactive session dial timed out");
                        return;
                    }
                };

                if shared.cancel.is_cancelled() {
                    // The registry has already been drained; pooling the
                    // session now would resurrect it. Tear it down.
                    shared.close_session(&session).await;
                    return;
                }

                {
                    let mut idle = shared.idle.lock().unwrap();
                    session.touch_idle(Instant::now());
                    idle.insert(Arc::clone(&session));
                }
                tracing::debug!(seq = session.seq(), "created proactive session");
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
