use thiserror::Error;

/// Top-level error type for Stride.
#[derive(Debug, Error)]
pub enum StrideError {
    /// Transient failure talking to the chat gateway (network, timeout,
    /// or an API-level error). The dispatch loop retries on the next
    /// iteration.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Storage error.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// No chat identity holds the given verification code. Surfaced as a
    /// not-found response on the linking endpoint; never mutates state.
    #[error("verification code not found")]
    CodeNotFound,

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
