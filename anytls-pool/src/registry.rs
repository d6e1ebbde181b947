//! [`SessionRegistry`] — authoritative map of live sessions by sequence.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::session::PooledSession;

// ---------------------------------------------------------------------------
// SessionRegistry
// ---------------------------------------------------------------------------

/// Source of truth for "is this session still alive".
///
/// A session is inserted on successful creation and removed by its death
/// hook. A session can be here but absent from the idle pool while it
/// carries active streams.
pub(crate) struct SessionRegistry {
    sessions: Mutex<HashMap<u64, Arc<PooledSession>>>,
}

// ---

impl SessionRegistry {
    // ---
    pub(crate) fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    // ---

    pub(crate) fn insert(&self, seq: u64, session: Arc<PooledSession>) {
        self.sessions.lock().unwrap().insert(seq, session);
    }

    // ---

    pub(crate) fn remove(&self, seq: u64) {
        self.sessions.lock().unwrap().remove(&seq);
    }

    // ---

    /// Snapshot every live session and empty the map in one critical
    /// section. Shutdown closes the snapshot outside the lock.
    pub(crate) fn drain(&self) -> Vec<Arc<PooledSession>> {
        // ---
        let mut sessions = self.sessions.lock().unwrap();
        sessions.drain().map(|(_, session)| session).collect()
    }

    // ---

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}
