use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ---

use async_trait::async_trait;

// ---

use anytls_domain::{AnyTlsError, AnyTlsSessionPtr, Result, SessionDialer};

// ---

use super::config::SimConfig;
use super::session::SimSession;

// ---------------------------------------------------------------------------
// SimDialer
// ---------------------------------------------------------------------------

/// In-process mock dialer. Does not use real sockets.
///
/// Every successful dial produces a fresh [`SimSession`], retained here so
/// tests can reach back into any session the pool has dialed (to kill it,
/// count closes, or grab stream peers).
pub struct SimDialer {
    // ---
    config: SimConfig,
    dials: AtomicUsize,
    sessions: Mutex<Vec<Arc<SimSession>>>,
}

// ---

impl SimDialer {
    // ---
    pub fn new(config: SimConfig) -> Self {
        // ---
        Self {
            config,
            dials: AtomicUsize::new(0),
            sessions: Mutex::new(Vec::new()),
        }
    }

    // ---

    /// Total dial attempts, successful or not.
    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::Relaxed)
    }

    // ---

    /// The `idx`-th session ever dialed (dial order, starting at 0).
    ///
    /// Panics when out of range — test-only accessor.
    pub fn session(&self, idx: usize) -> Arc<SimSession> {
        Arc::clone(&self.sessions.lock().unwrap()[idx])
    }

    // ---

    /// The most recently dialed session, if any.
    pub fn last_session(&self) -> Option<Arc<SimSession>> {
        self.sessions.lock().unwrap().last().cloned()
    }
}

// ---

#[async_trait]
impl SessionDialer for SimDialer {
    // ---
    async fn dial(&self) -> Result<AnyTlsSessionPtr> {
        // ---
        self.dials.fetch_add(1, Ordering::Relaxed);

        if let Some(delay) = self.config.dial_delay {
            tokio::time::sleep(delay).await;
        }
        if self.config.fail_dials {
            return Err(AnyTlsError::Transport("injected dial failure".into()));
        }

        let session = Arc::new(SimSession::new(&self.config));
        self.sessions.lock().unwrap().push(Arc::clone(&session));
        Ok(session)
    }
}
