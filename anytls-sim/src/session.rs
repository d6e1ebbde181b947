use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ---

use async_trait::async_trait;
use tokio::io::DuplexStream;
use tokio::sync::watch;

// ---

use anytls_domain::{
    // ---
    AnyTlsError,
    AnyTlsSession,
    AnyTlsStreamPtr,
    Result,
};

// ---

use super::SimConfig;

// ---------------------------------------------------------------------------
// SimSession
// ---------------------------------------------------------------------------

/// In-process mock session. Streams are `tokio::io::duplex` pairs; the
/// local half goes to the caller, the remote half is queued for the test to
/// pick up via [`SimSession::take_peer`].
pub struct SimSession {
    // ---
    closed_tx: watch::Sender<bool>,
    closed_rx: watch::Receiver<bool>,

    /// Remote halves of opened streams, oldest first.
    peers: Mutex<Vec<DuplexStream>>,

    close_calls: AtomicUsize,
    fail_streams: bool,
}

// ---

impl SimSession {
    // ---
    pub fn new(config: &SimConfig) -> Self {
        // ---
        let (closed_tx, closed_rx) = watch::channel(false);
        Self {
            closed_tx,
            closed_rx,
            peers: Mutex::new(Vec::new()),
            close_calls: AtomicUsize::new(0),
            fail_streams: config.fail_streams,
        }
    }

    // ---

    /// Simulate spontaneous transport death (peer reset, TLS alert) without
    /// going through `close`.
    pub fn kill(&self) {
        self.closed_tx.send_replace(true);
    }

    // ---

    /// Take the remote half of the oldest opened stream, if any.
    pub fn take_peer(&self) -> Option<DuplexStream> {
        // ---
        let mut peers = self.peers.lock().unwrap();
        if peers.is_empty() {
            None
        } else {
            Some(peers.remove(0))
        }
    }

    // ---

    /// Number of times `close` has been called on this session.
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::Relaxed)
    }
}

// ---

#[async_trait]
impl AnyTlsSession for SimSession {
    // ---
    async fn open_stream(&self) -> Result<AnyTlsStreamPtr> {
        // ---
        if *self.closed_rx.borrow() {
            return Err(AnyTlsError::SessionClosed);
        }
        if self.fail_streams {
            return Err(AnyTlsError::Transport("injected stream failure".into()));
        }

        let (local, remote) = tokio::io::duplex(64 * 1024);
        self.peers.lock().unwrap().push(remote);
        Ok(Box::new(local))
    }

    // ---

    fn is_closed(&self) -> bool {
        *self.closed_rx.borrow()
    }

    fn closed_rx(&self) -> watch::Receiver<bool> {
        self.closed_rx.clone()
    }

    // ---

    async fn close(&self) -> Result<()> {
        // ---
        self.close_calls.fetch_add(1, Ordering::Relaxed);
        self.closed_tx.send_replace(true);
        Ok(())
    }

    // ---

    fn run(&self) {
        // No protocol loop to start — the mock has no wire.
    }
}
