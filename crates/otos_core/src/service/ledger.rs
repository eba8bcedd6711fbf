//! Task ledger use-cases: submission, listing and the done/delete
//! transitions with their score effects.
//!
//! # Invariants
//! - `complete` is gated on task age and awards `priority` points once.
//! - `delete` removes the row and charges the configured penalty, no floor.
//! - Done tasks can be neither completed again nor deleted (`AlreadyDone`).

use super::engine::{require_user, Engine, EngineError, EngineResult};
use super::scoring::{apply_score_delta, rank_of};
use crate::input::{Action, ActionVerb};
use crate::model::rank::Rank;
use crate::model::task::{NewTask, Task, TaskId, TaskStatus};
use crate::model::user::ExternalId;
use crate::repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use chrono::Duration;
use log::{debug, info};
use rusqlite::Connection;

/// Result of a successful completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub task_id: TaskId,
    /// Net points granted (the task priority).
    pub points: i64,
    pub score: i64,
    pub rank: Rank,
}

/// Result of a successful deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deletion {
    pub task_id: TaskId,
    /// Points removed from the owner.
    pub penalty: i64,
    pub score: i64,
    pub rank: Rank,
}

/// Outcome of a transport button action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed(Completion),
    Deleted(Deletion),
}

impl Engine {
    /// Validates and stores a new pending task for a registered user.
    pub fn submit(
        &self,
        external_id: ExternalId,
        title: &str,
        category: &str,
        priority: i64,
    ) -> EngineResult<TaskId> {
        let created_at = self.now();
        let task_id = self.store().with_tx(|tx| -> EngineResult<TaskId> {
            let owner = require_user(tx, external_id)?;
            let new_task = NewTask::validate(title, category, priority)?;
            let task = Task {
                id: TaskId::new(),
                owner: owner.id,
                title: new_task.title,
                category: new_task.category,
                priority: new_task.priority,
                created_at,
                status: TaskStatus::Pending,
            };
            Ok(SqliteTaskRepository::new(tx).insert_task(&task)?)
        })?;

        info!(
            "event=task_submit module=ledger status=ok external_id={external_id} task_id={task_id} priority={priority}"
        );
        Ok(task_id)
    }

    /// Pending tasks of the user, oldest first.
    pub fn list_pending(&self, external_id: ExternalId) -> EngineResult<Vec<Task>> {
        self.list_for(external_id, TaskListQuery { pending_only: true })
    }

    /// Pending and done tasks of the user, oldest first.
    pub fn list_all(&self, external_id: ExternalId) -> EngineResult<Vec<Task>> {
        self.list_for(external_id, TaskListQuery::default())
    }

    fn list_for(&self, external_id: ExternalId, query: TaskListQuery) -> EngineResult<Vec<Task>> {
        self.store().with_conn(|conn| -> EngineResult<Vec<Task>> {
            let owner = require_user(conn, external_id)?;
            Ok(SqliteTaskRepository::new(conn).list_tasks(owner.id, query)?)
        })
    }

    /// Marks a task done and awards its priority to the owner.
    ///
    /// Fails with `TooSoon` while the task is younger than the completion
    /// gate; nothing is mutated in that case.
    pub fn complete(&self, task_id: TaskId) -> EngineResult<Completion> {
        self.complete_checked(task_id, None)
    }

    /// Deletes an owned, not yet done task and charges the deletion penalty.
    pub fn delete(&self, task_id: TaskId, external_id: ExternalId) -> EngineResult<Deletion> {
        let penalty = self.config().delete_penalty;
        let deletion = self.store().with_tx(|tx| -> EngineResult<Deletion> {
            let task = load_owned_task(tx, task_id, Some(external_id))?;
            if task.is_done() {
                return Err(EngineError::AlreadyDone(task_id));
            }
            SqliteTaskRepository::new(tx).delete_task(task_id)?;
            let score = apply_score_delta(tx, task.owner, -penalty)?;
            Ok(Deletion {
                task_id,
                penalty,
                score,
                rank: rank_of(score),
            })
        })?;

        info!(
            "event=task_delete module=ledger status=ok external_id={external_id} task_id={task_id} score={}",
            deletion.score
        );
        Ok(deletion)
    }

    /// Dispatches a parsed `<verb>:<task_id>` action on behalf of `sender`.
    ///
    /// Both verbs require `sender` to own the task.
    pub fn apply_action(&self, sender: ExternalId, action: &Action) -> EngineResult<ActionOutcome> {
        match action.verb {
            ActionVerb::Done => self
                .complete_checked(action.task_id, Some(sender))
                .map(ActionOutcome::Completed),
            ActionVerb::Delete => self
                .delete(action.task_id, sender)
                .map(ActionOutcome::Deleted),
        }
    }

    fn complete_checked(
        &self,
        task_id: TaskId,
        sender: Option<ExternalId>,
    ) -> EngineResult<Completion> {
        let now = self.now();
        let gate = self.config().completion_gate();
        let completion = self.store().with_tx(|tx| -> EngineResult<Completion> {
            let task = load_owned_task(tx, task_id, sender)?;
            if task.is_done() {
                return Err(EngineError::AlreadyDone(task_id));
            }

            let elapsed = now - task.created_at;
            if elapsed < gate {
                let minutes_remaining = minutes_remaining(gate - elapsed);
                debug!(
                    "event=task_complete module=ledger status=too_soon task_id={task_id} minutes_remaining={minutes_remaining}"
                );
                return Err(EngineError::TooSoon { minutes_remaining });
            }

            if !SqliteTaskRepository::new(tx).mark_done(task_id, now)? {
                return Err(EngineError::AlreadyDone(task_id));
            }
            let points = task.priority.points();
            let score = apply_score_delta(tx, task.owner, points)?;
            Ok(Completion {
                task_id,
                points,
                score,
                rank: rank_of(score),
            })
        })?;

        info!(
            "event=task_complete module=ledger status=ok task_id={task_id} points={} score={}",
            completion.points, completion.score
        );
        Ok(completion)
    }
}

/// Loads a task and, when `owner` is given, checks that it belongs to them.
/// An unregistered `owner` is treated as a non-owner.
fn load_owned_task(
    conn: &Connection,
    task_id: TaskId,
    owner: Option<ExternalId>,
) -> EngineResult<Task> {
    let task = SqliteTaskRepository::new(conn)
        .get_task(task_id)?
        .ok_or(EngineError::TaskNotFound(task_id))?;

    if let Some(external_id) = owner {
        let is_owner = SqliteUserRepository::new(conn)
            .get_by_external_id(external_id)?
            .is_some_and(|user| user.id == task.owner);
        if !is_owner {
            return Err(EngineError::NotOwner(task_id));
        }
    }
    Ok(task)
}

/// Whole minutes left, rounded down.
fn minutes_remaining(remaining: Duration) -> i64 {
    remaining.num_seconds().max(0) / 60
}
