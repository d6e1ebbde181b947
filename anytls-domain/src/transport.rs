use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;

use super::error::Result;

// ---------------------------------------------------------------------------
// AnyTlsStream
// ---------------------------------------------------------------------------

/// A single multiplexed logical channel over one session.
///
/// Implements [`AsyncRead`] + [`AsyncWrite`] so everything above the session
/// layer (proxy adapters, relay loops) is transport-agnostic. Framing,
/// padding, and the stream-id handshake live below this trait, inside the
/// session implementation.
pub trait AnyTlsStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> AnyTlsStream for T {}

// ---

/// Convenience type alias for a heap-allocated [`AnyTlsStream`].
pub type AnyTlsStreamPtr = Box<dyn AnyTlsStream>;

/// Convenience type alias for a shared [`AnyTlsSession`].
pub type AnyTlsSessionPtr = Arc<dyn AnyTlsSession>;

// ---------------------------------------------------------------------------
// AnyTlsSession
// ---------------------------------------------------------------------------

/// One live AnyTLS transport connection to a remote endpoint.
///
/// Produced fully handshaken by a [`SessionDialer`]; carries many streams
/// over its lifetime. The pool layer above decides when a session is dialed,
/// reused, and torn down — a session implementation only reports its own
/// death and hands out streams while alive.
#[async_trait]
pub trait AnyTlsSession: Send + Sync {
    // ---
    /// Open a new multiplexed stream on this session.
    ///
    /// Fails with [`AnyTlsError::SessionClosed`](super::AnyTlsError::SessionClosed)
    /// once the session has died.
    async fn open_stream(&self) -> Result<AnyTlsStreamPtr>;

    /// True once the session has died. Transitions false → true exactly
    /// once and never reverts.
    fn is_closed(&self) -> bool;

    /// Subscribe to the closed transition.
    ///
    /// The channel starts at `false` and flips to `true` when the session
    /// dies, whether by [`close`](Self::close) or by transport failure. Use
    /// [`watch::Receiver::wait_for`] to await death; a dropped sender also
    /// means the session is gone.
    fn closed_rx(&self) -> watch::Receiver<bool>;

    /// Close the session. Idempotent; after return [`is_closed`](Self::is_closed)
    /// reports true.
    async fn close(&self) -> Result<()>;

    /// Start the session's internal protocol loop (recv pump, keepalive).
    ///
    /// Called once after the session is registered. Must not block; spawn
    /// whatever tasks the implementation needs.
    fn run(&self);
}

// ---------------------------------------------------------------------------
// SessionDialer
// ---------------------------------------------------------------------------

/// Factory for new sessions to one fixed remote endpoint.
///
/// Owns everything needed to produce a ready session: the underlying
/// TCP/TLS dialer, credentials, and the padding scheme. One dialer per
/// remote; the session pool never chooses between endpoints.
#[async_trait]
pub trait SessionDialer: Send + Sync {
    // ---
    /// Dial the remote and return a live, framed session.
    ///
    /// Cancellation is the caller's concern: drop the future or wrap it in
    /// `tokio::time::timeout`.
    async fn dial(&self) -> Result<AnyTlsSessionPtr>;
}

// ---

/// Convenience type alias for a shared [`SessionDialer`].
pub type SessionDialerPtr = Arc<dyn SessionDialer>;
