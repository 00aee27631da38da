//! Error types raised by repository implementations.

use thiserror::Error;

/// Errors surfaced by hunter repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("hunter repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
