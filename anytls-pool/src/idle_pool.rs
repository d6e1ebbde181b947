//! [`IdlePool`] — idle sessions ordered newest-first.
//!
//! Sessions are keyed by `u64::MAX - seq`, so ascending key order is
//! descending `seq`: the smallest key is the newest session. The reuse path
//! pops the newest idle session and the maintenance sweep visits
//! newest-first, which steers traffic toward fresh sessions and leaves the
//! oldest ones to idle out.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::session::PooledSession;

// ---------------------------------------------------------------------------
// IdlePool
// ---------------------------------------------------------------------------

/// Ordered collection of sessions with no outstanding streams.
///
/// Not internally synchronized — the manager wraps it in the idle-pool
/// mutex and every method here assumes that lock is held.
pub(crate) struct IdlePool {
    sessions: BTreeMap<u64, Arc<PooledSession>>,
}

// ---

impl IdlePool {
    // ---
    pub(crate) fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
        }
    }

    // ---

    fn key(seq: u64) -> u64 {
        u64::MAX - seq
    }

    // ---

    /// Insert a session. The session must not already be present; `seq` is
    /// unique, so a collision here is a reuse-accounting bug upstream.
    pub(crate) fn insert(&mut self, session: Arc<PooledSession>) {
        // ---
        let prev = self.sessions.insert(Self::key(session.seq()), session);
        debug_assert!(prev.is_none(), "session inserted into idle pool twice");
    }

    // ---

    /// Remove by sequence number. No-op when absent.
    pub(crate) fn remove(&mut self, seq: u64) -> Option<Arc<PooledSession>> {
        self.sessions.remove(&Self::key(seq))
    }

    // ---

    /// Remove and return the newest idle session (highest `seq`).
    pub(crate) fn pop_newest(&mut self) -> Option<Arc<PooledSession>> {
        self.sessions.pop_first().map(|(_, session)| session)
    }

    // ---

    /// Visit every idle session newest-first, dropping those for which `f`
    /// returns false. Decision and removal happen in one structural pass,
    /// so the whole sweep sees a single consistent view of the pool.
    pub(crate) fn retain(&mut self, mut f: impl FnMut(&Arc<PooledSession>) -> bool) {
        self.sessions.retain(|_, session| f(session));
    }

    // ---

    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    // ---
    use std::sync::Arc;

    use tokio::time::Instant;

    use anytls_sim::{SimConfig, SimSession};

    use super::IdlePool;
    use crate::session::PooledSession;

    // ---

    fn session(seq: u64) -> Arc<PooledSession> {
        // ---
        let transport = Arc::new(SimSession::new(&SimConfig::perfect()));
        Arc::new(PooledSession::new(seq, transport, Instant::now()))
    }

    // ---

    #[tokio::test]
    async fn pop_newest_returns_highest_seq() {
        // ---
        let mut pool = IdlePool::new();
        pool.insert(session(3));
        pool.insert(session(1));
        pool.insert(session(7));

        assert_eq!(pool.pop_newest().unwrap().seq(), 7);
        assert_eq!(pool.pop_newest().unwrap().seq(), 3);
        assert_eq!(pool.pop_newest().unwrap().seq(), 1);
        assert!(pool.pop_newest().is_none());
    }

    // ---

    #[tokio::test]
    async fn retain_visits_newest_first() {
        // ---
        let mut pool = IdlePool::new();
        for seq in [2, 5, 1, 4] {
            pool.insert(session(seq));
        }

        let mut visited = Vec::new();
        pool.retain(|s| {
            visited.push(s.seq());
            true
        });

        assert_eq!(visited, vec![5, 4, 2, 1], "traversal must be descending seq");
        assert_eq!(pool.len(), 4);
    }

    // ---

    #[tokio::test]
    async fn retain_removes_rejected_sessions() {
        // ---
        let mut pool = IdlePool::new();
        for seq in 1..=5 {
            pool.insert(session(seq));
        }

        // Keep only even seqs.
        pool.retain(|s| s.seq() % 2 == 0);

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.pop_newest().unwrap().seq(), 4);
        assert_eq!(pool.pop_newest().unwrap().seq(), 2);
    }

    // ---

    #[tokio::test]
    async fn remove_absent_is_noop() {
        // ---
        let mut pool = IdlePool::new();
        pool.insert(session(1));

        assert!(pool.remove(99).is_none());
        assert_eq!(pool.len(), 1);
        assert!(pool.remove(1).is_some());
        assert_eq!(pool.len(), 0);
    }
}
