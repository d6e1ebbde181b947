use thiserror::Error;

// ---

#[derive(Debug, Error)]
pub enum AnyTlsError {
    // ---
    #[error("transport error: {0}")]
    Transport(String),

    #[error("session closed")]
    SessionClosed,

    #[error("session pool closed")]
    PoolClosed,

    #[error("failed to create session: {0}")]
    CreateSession(String),

    #[error("failed to create stream: {0}")]
    CreateStream(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// ---

pub type Result<T> = std::result::Result<T, AnyTlsError>;
