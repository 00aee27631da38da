//! Errors surfaced by the runtime API.

use thiserror::Error;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("scheduler task join failed")]
    SchedulerJoin(#[source] tokio::task::JoinError),
}
