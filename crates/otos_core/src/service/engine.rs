//! Engine service object and its error taxonomy.
//!
//! # Responsibility
//! - Own the shared store, the time source and the validated configuration.
//! - Map repository failures into user-facing outcomes.
//!
//! # Invariants
//! - Every calendar-day computation goes through one fixed offset.
//! - Date arithmetic never panics; out-of-range dates surface as
//!   `EngineError::InvalidDate`.

use crate::clock::Clock;
use crate::config::{ConfigError, EngineConfig};
use crate::db::{DbError, Store};
use crate::model::task::{InvalidTask, TaskField, TaskId};
use crate::model::user::{ExternalId, User};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::RepoError;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;
use std::sync::Arc;

pub type EngineResult<T> = Result<T, EngineError>;

/// Outcome taxonomy for core operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("user {0} is not registered")]
    UnknownUser(ExternalId),
    #[error("user {0} is already registered")]
    AlreadyRegistered(ExternalId),
    #[error("display name must not be empty")]
    EmptyDisplayName,
    #[error("invalid task {field}")]
    InvalidTask { field: TaskField },
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("task {0} belongs to another user")]
    NotOwner(TaskId),
    #[error("task is too young to complete, {minutes_remaining} minutes remaining")]
    TooSoon { minutes_remaining: i64 },
    #[error("task {0} is already done")]
    AlreadyDone(TaskId),
    #[error("user {0} is not the administrator")]
    NotAdmin(ExternalId),
    #[error("date {0} is outside the supported range")]
    InvalidDate(NaiveDate),
    #[error("persistence failure: {0}")]
    Persistence(#[source] RepoError),
    #[error("blocking worker failed: {0}")]
    Worker(String),
}

impl EngineError {
    /// Whether this is a user-facing outcome rather than a storage failure.
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::Persistence(_) | Self::Worker(_))
    }
}

impl From<InvalidTask> for EngineError {
    fn from(value: InvalidTask) -> Self {
        Self::InvalidTask { field: value.field }
    }
}

impl From<RepoError> for EngineError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateUser(external_id) => Self::AlreadyRegistered(external_id),
            RepoError::TaskNotFound(task_id) => Self::TaskNotFound(task_id),
            other => Self::Persistence(other),
        }
    }
}

impl From<DbError> for EngineError {
    fn from(value: DbError) -> Self {
        Self::Persistence(RepoError::Db(value))
    }
}

/// Explicitly constructed service object for every core use-case.
///
/// Holds the shared store, the time source and the validated configuration.
/// Callers share it behind an `Arc`; all methods take `&self`.
pub struct Engine {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    offset: FixedOffset,
}

impl Engine {
    pub fn new(
        store: Arc<Store>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let offset = config.offset()?;
        Ok(Self {
            store,
            clock,
            config,
            offset,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The single timezone every calendar-day computation uses.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current calendar date in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.offset).date_naive()
    }

    /// UTC bounds `[start, end)` of a calendar date in the configured timezone.
    pub fn day_bounds(&self, date: NaiveDate) -> EngineResult<(DateTime<Utc>, DateTime<Utc>)> {
        let shift = Duration::seconds(i64::from(self.offset.local_minus_utc()));
        let start = date
            .and_time(NaiveTime::MIN)
            .checked_sub_signed(shift)
            .ok_or(EngineError::InvalidDate(date))?;
        let end = start
            .checked_add_signed(Duration::days(1))
            .ok_or(EngineError::InvalidDate(date))?;
        Ok((start.and_utc(), end.and_utc()))
    }

    /// Runs a synchronous store operation on tokio's blocking pool.
    pub(crate) async fn run_blocking<T, F>(self: &Arc<Self>, op: F) -> EngineResult<T>
    where
        F: FnOnce(&Engine) -> EngineResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let engine = Arc::clone(self);
        tokio::task::spawn_blocking(move || op(&engine))
            .await
            .map_err(|err| EngineError::Worker(err.to_string()))?
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }
}

/// Resolves an external identity or fails with `UnknownUser`.
pub(crate) fn require_user(conn: &Connection, external_id: ExternalId) -> EngineResult<User> {
    SqliteUserRepository::new(conn)
        .get_by_external_id(external_id)?
        .ok_or(EngineError::UnknownUser(external_id))
}
