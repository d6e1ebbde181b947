//! [`PooledStream`] — a stream handle that returns its session to the pool.
//!
//! Dropping the stream is the stream-death event of the session layer: the
//! `Drop` impl decides, from the observable state of the parent session and
//! the manager at that moment, whether the session goes back into the idle
//! pool or is torn down. A finished stream never strands a usable session.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

// ---

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

// ---

use anytls_domain::AnyTlsStreamPtr;

// ---

use crate::manager::PoolShared;
use crate::session::PooledSession;

// ---------------------------------------------------------------------------
// PooledStream
// ---------------------------------------------------------------------------

/// One multiplexed stream, checked out of the pool.
///
/// Reads and writes delegate to the transport stream. On drop the parent
/// session is handed back to the manager:
///
/// - parent already closed → nothing to do, its death hook owns cleanup;
/// - manager cancelled → the session is closed asynchronously;
/// - otherwise → the session re-enters the idle pool with a fresh
///   `idle_since`.
pub struct PooledStream {
    // ---
    stream: AnyTlsStreamPtr,
    session: Arc<PooledSession>,
    shared: Arc<PoolShared>,
}

impl std::fmt::Debug for PooledStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledStream").finish_non_exhaustive()
    }
}

// ---

impl PooledStream {
    // ---
    pub(crate) fn new(
        stream: AnyTlsStreamPtr,
        session: Arc<PooledSession>,
        shared: Arc<PoolShared>,
    ) -> Self {
        Self {
            stream,
            session,
            shared,
        }
    }
}

// ---

impl AsyncRead for PooledStream {
    // ---
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

// ---

impl AsyncWrite for PooledStream {
    // ---
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, data)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

// ---

#[cfg(test)]
impl PooledStream {
    /// Sequence number of the parent session — test-only visibility.
    pub(crate) fn session_seq(&self) -> u64 {
        self.session.seq()
    }
}

// ---

impl Drop for PooledStream {
    // ---
    fn drop(&mut self) {
        Arc::clone(&self.shared).return_session(Arc::clone(&self.session));
    }
}
