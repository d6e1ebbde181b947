//! Core traits and types for the AnyTLS session layer.
//!
//! This crate defines the vocabulary of the system. The pool crate and the
//! transport implementations depend on `anytls-domain` and speak its types.
//! No implementations live here.
//!
//! # Structure
//!
//! - [`error`]     — [`AnyTlsError`] and [`Result<T>`] alias
//! - [`transport`] — [`AnyTlsStream`], [`AnyTlsSession`], [`SessionDialer`] traits

mod error;
mod transport;

// --- error
pub use error::{AnyTlsError, Result};

// --- transport
pub use transport::{
    // ---
    AnyTlsSession,
    AnyTlsSessionPtr,
    AnyTlsStream,
    AnyTlsStreamPtr,
    SessionDialer,
    SessionDialerPtr,
};
