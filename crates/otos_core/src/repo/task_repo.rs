//! Task repository contract and SQLite implementation.
//!
//! # Invariants
//! - Listings are in creation order (`created_at`, then insertion rowid).
//! - `mark_done` is a compare-and-set on `done = 0`; a second call for the
//!   same task reports `false` and changes nothing.
//! - Deletion is physical. There is no tombstone.

use crate::model::task::{Priority, Task, TaskId, TaskStatus};
use crate::model::user::UserId;
use crate::repo::{from_epoch_ms, to_epoch_ms, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    user_id,
    title,
    category,
    priority,
    created_at,
    done,
    done_at
FROM tasks";

/// Filter for owner-scoped task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    /// Excludes done tasks when set.
    pub pending_only: bool,
}

/// Repository interface for task records.
pub trait TaskRepository {
    fn insert_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, owner: UserId, query: TaskListQuery) -> RepoResult<Vec<Task>>;
    /// Flips a pending task to done. Returns `false` when it was already done.
    fn mark_done(&self, id: TaskId, done_at: DateTime<Utc>) -> RepoResult<bool>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Done tasks of `owner` with `from <= done_at < to`, oldest completion first.
    fn list_done_between(
        &self,
        owner: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<Vec<Task>>;
    fn count_pending(&self, owner: UserId) -> RepoResult<u64>;
}

/// SQLite-backed task repository over a borrowed connection or transaction.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn collect(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut rows = stmt.query(params)?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn insert_task(&self, task: &Task) -> RepoResult<TaskId> {
        self.conn.execute(
            "INSERT INTO tasks (
                uuid,
                user_id,
                title,
                category,
                priority,
                created_at,
                done,
                done_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                task.id.to_string(),
                task.owner.0,
                task.title.as_str(),
                task.category.as_str(),
                task.priority.level(),
                to_epoch_ms(task.created_at),
                i64::from(task.is_done()),
                task.done_at().map(to_epoch_ms),
            ],
        )?;
        Ok(task.id)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let tasks = self.collect(
            &format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"),
            [id.to_string()],
        )?;
        Ok(tasks.into_iter().next())
    }

    fn list_tasks(&self, owner: UserId, query: TaskListQuery) -> RepoResult<Vec<Task>> {
        self.collect(
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE user_id = ?1
                   AND (?2 = 0 OR done = 0)
                 ORDER BY created_at ASC, rowid ASC;"
            ),
            params![owner.0, i64::from(query.pending_only)],
        )
    }

    fn mark_done(&self, id: TaskId, done_at: DateTime<Utc>) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks SET done = 1, done_at = ?1 WHERE uuid = ?2 AND done = 0;",
            params![to_epoch_ms(done_at), id.to_string()],
        )?;
        if changed == 1 {
            return Ok(true);
        }

        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if exists {
            Ok(false)
        } else {
            Err(RepoError::TaskNotFound(id))
        }
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }
        Ok(())
    }

    fn list_done_between(
        &self,
        owner: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<Vec<Task>> {
        self.collect(
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE user_id = ?1
                   AND done = 1
                   AND done_at >= ?2
                   AND done_at < ?3
                 ORDER BY done_at ASC, rowid ASC;"
            ),
            params![owner.0, to_epoch_ms(from), to_epoch_ms(to)],
        )
    }

    fn count_pending(&self, owner: UserId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE user_id = ?1 AND done = 0;",
            [owner.0],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative task count `{count}`")))
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let id = uuid_text.parse::<TaskId>().map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in tasks.uuid"))
    })?;

    let level: i64 = row.get("priority")?;
    let priority = Priority::from_level(level).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid priority `{level}` in tasks.priority"))
    })?;

    let status = match (row.get::<_, i64>("done")?, row.get::<_, Option<i64>>("done_at")?) {
        (0, None) => TaskStatus::Pending,
        (1, Some(done_at)) => TaskStatus::Done {
            done_at: from_epoch_ms(done_at, "tasks.done_at")?,
        },
        (done, done_at) => {
            return Err(RepoError::InvalidData(format!(
                "inconsistent done state done={done} done_at={done_at:?} for task {id}"
            )));
        }
    };

    Ok(Task {
        id,
        owner: UserId(row.get("user_id")?),
        title: row.get("title")?,
        category: row.get("category")?,
        priority,
        created_at: from_epoch_ms(row.get("created_at")?, "tasks.created_at")?,
        status,
    })
}
