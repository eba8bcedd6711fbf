//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for users and tasks.
//! - Isolate SQL details from service orchestration.
//!
//! # Invariants
//! - Timestamps are persisted as UTC epoch milliseconds.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repositories never open transactions; callers own transaction scope.

use crate::db::DbError;
use crate::model::task::TaskId;
use crate::model::user::{ExternalId, UserId};
use chrono::{DateTime, Utc};

pub mod task_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for user/task persistence and queries.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("user already exists: {0}")]
    DuplicateUser(ExternalId),
    #[error("user not found: {0:?}")]
    UserNotFound(UserId),
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn to_epoch_ms(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub(crate) fn from_epoch_ms(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| RepoError::InvalidData(format!("timestamp `{value}` out of range in {column}")))
}
