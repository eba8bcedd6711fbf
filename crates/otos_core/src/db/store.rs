use super::{DbError, DbResult};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Mutex, MutexGuard};

/// Shared handle over the single SQLite connection.
///
/// The scheduled digest job and request handling may run concurrently, so
/// access is serialized through a mutex. Guards are only held for the span of
/// one synchronous closure and never across an `.await`.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Wraps an already-migrated connection (see [`super::open_db`]).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Runs `f` inside one immediate transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back otherwise.
    pub fn with_tx<T, E>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let mut guard = self.lock()?;
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DbError::from)?;
        let value = f(&tx)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }

    /// Runs a read-only closure against the connection.
    pub fn with_conn<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let guard = self.lock()?;
        f(&guard)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }
}
