//! Client-side session pool for the AnyTLS session layer.
//!
//! One [`PoolManager`] serves one remote endpoint. It multiplexes
//! application streams onto a small population of long-lived sessions,
//! reusing the newest idle session for each request, and keeps that
//! population healthy in the background: idle sessions time out, old
//! sessions rotate on a jittered lifetime, and an optional proactive path
//! refills the pool ahead of demand — all on a single maintenance tick.
//!
//! The pool does not dial, frame, or encrypt anything itself. It consumes
//! a [`anytls_domain::SessionDialer`] and hands out streams as
//! [`PooledStream`]; dropping a stream returns its session to the pool.
//!
//! # Structure
//!
//! - [`config`]    — [`PoolConfig`], floors, and the three-layer merge
//! - [`idle_pool`] — newest-first ordered pool of reusable sessions
//! - [`registry`]  — authoritative map of live sessions
//! - [`session`]   — per-session bookkeeping (seq, timestamps, death hook)
//! - [`stream`]    — [`PooledStream`] return-to-pool handle
//! - [`manager`]   — [`PoolManager`] request path, maintenance, shutdown
//! - [`ticker`]    — the periodic maintenance driver

mod config;
mod idle_pool;
mod manager;
mod registry;
mod session;
mod stream;
mod ticker;

// --- config
pub use config::{GlobalPoolConfig, LegacyOptions, PoolConfig, SessionOverride};

// --- manager
pub use manager::PoolManager;

// --- stream
pub use stream::PooledStream;
