//! Error types for engine operations

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur during cleanup, sync, or scheduling.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A cleanup or full sync is already in flight; the request was
    /// rejected, not queued.
    #[error("a cleanup or sync operation is already running")]
    AlreadyRunning,

    /// The target platform is unreachable; the run aborted with zero
    /// progress.
    #[error("platform unreachable: {0}")]
    Unreachable(String),

    /// Store-layer failure outside the per-channel isolation path
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid schedule expression or timezone
    #[error("invalid schedule: {0}")]
    Schedule(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stats document (de)serialization error
    #[error("stats serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
