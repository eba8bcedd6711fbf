//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - `external_id` is unique; a duplicate insert surfaces as
//!   `RepoError::DuplicateUser`, never as a raw constraint error.

use crate::model::user::{ExternalId, User, UserId};
use crate::repo::{from_epoch_ms, to_epoch_ms, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, external_id, display_name, score, joined_at FROM users";

/// Repository interface for user records.
pub trait UserRepository {
    fn create_user(
        &self,
        external_id: ExternalId,
        display_name: &str,
        joined_at: DateTime<Utc>,
    ) -> RepoResult<User>;
    fn get_by_external_id(&self, external_id: ExternalId) -> RepoResult<Option<User>>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// All external ids in registration order.
    fn list_external_ids(&self) -> RepoResult<Vec<ExternalId>>;
    /// Adds `delta` to the stored score and returns the new score.
    fn add_score(&self, id: UserId, delta: i64) -> RepoResult<i64>;
}

/// SQLite-backed user repository over a borrowed connection or transaction.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(
        &self,
        external_id: ExternalId,
        display_name: &str,
        joined_at: DateTime<Utc>,
    ) -> RepoResult<User> {
        let inserted = self.conn.execute(
            "INSERT INTO users (external_id, display_name, score, joined_at)
             VALUES (?1, ?2, 0, ?3);",
            params![external_id.0, display_name, to_epoch_ms(joined_at)],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(RepoError::DuplicateUser(external_id));
            }
            Err(err) => return Err(err.into()),
        }

        let id = UserId(self.conn.last_insert_rowid());
        self.get_user(id)?.ok_or(RepoError::UserNotFound(id))
    }

    fn get_by_external_id(&self, external_id: ExternalId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{USER_SELECT_SQL} WHERE external_id = ?1;"))?;
        let mut rows = stmt.query([external_id.0])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.0])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_external_ids(&self) -> RepoResult<Vec<ExternalId>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT external_id FROM users ORDER BY id ASC;")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0).map(ExternalId))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn add_score(&self, id: UserId, delta: i64) -> RepoResult<i64> {
        let changed = self.conn.execute(
            "UPDATE users SET score = score + ?1 WHERE id = ?2;",
            params![delta, id.0],
        )?;
        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }

        self.conn
            .query_row("SELECT score FROM users WHERE id = ?1;", [id.0], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?
            .ok_or(RepoError::UserNotFound(id))
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let joined_at = from_epoch_ms(row.get("joined_at")?, "users.joined_at")?;
    Ok(User {
        id: UserId(row.get("id")?),
        external_id: ExternalId(row.get("external_id")?),
        display_name: row.get("display_name")?,
        score: row.get("score")?,
        joined_at,
    })
}
