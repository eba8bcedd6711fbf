//! Daily aggregation of completed work.
//!
//! Both the on-demand "today" query and the scheduled digest resolve calendar
//! days through [`Engine::day_bounds`], so they always agree on what "today"
//! means.

use super::engine::{require_user, Engine, EngineResult};
use crate::model::user::{ExternalId, UserId};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use chrono::NaiveDate;
use log::debug;
use rusqlite::Connection;

/// Tasks a user completed on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Titles in completion order.
    pub titles: Vec<String>,
    /// Sum of the priorities of the completed tasks.
    pub total_points: i64,
}

impl DailySummary {
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

impl Engine {
    /// Completed tasks for the current date in the configured timezone.
    pub fn today_completed(&self, external_id: ExternalId) -> EngineResult<DailySummary> {
        self.completed_on(external_id, self.today())
    }

    pub fn completed_on(
        &self,
        external_id: ExternalId,
        date: NaiveDate,
    ) -> EngineResult<DailySummary> {
        self.store().with_conn(|conn| -> EngineResult<DailySummary> {
            let user = require_user(conn, external_id)?;
            self.summarize(conn, user.id, date)
        })
    }

    /// Every registered identity, in registration order.
    pub fn all_registered_users(&self) -> EngineResult<Vec<ExternalId>> {
        self.store().with_conn(|conn| -> EngineResult<Vec<ExternalId>> {
            Ok(SqliteUserRepository::new(conn).list_external_ids()?)
        })
    }

    fn summarize(&self, conn: &Connection, owner: UserId, date: NaiveDate) -> EngineResult<DailySummary> {
        let (from, to) = self.day_bounds(date)?;
        let tasks = SqliteTaskRepository::new(conn).list_done_between(owner, from, to)?;
        let total_points = tasks.iter().map(|task| task.priority.points()).sum();
        let titles = tasks.into_iter().map(|task| task.title).collect::<Vec<_>>();

        debug!(
            "event=daily_summary module=report status=ok user_id={} date={date} count={} total={total_points}",
            owner.0,
            titles.len()
        );
        Ok(DailySummary {
            date,
            titles,
            total_points,
        })
    }
}
