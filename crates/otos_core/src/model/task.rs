//! Task domain model and submission validation.
//!
//! # Invariants
//! - `title` and `category` are non-empty after trimming.
//! - `priority` is one of the three fixed levels.
//! - `done_at` exists iff the task is done; `done` is irreversible.

use crate::model::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable task identifier, also carried in transport action tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Task priority. The numeric level doubles as the completion reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Priority {
    Normal = 1,
    Important = 2,
    Urgent = 3,
}

impl Priority {
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Self::Normal),
            2 => Some(Self::Important),
            3 => Some(Self::Urgent),
            _ => None,
        }
    }

    pub fn level(self) -> i64 {
        self as i64
    }

    /// Points granted when a task of this priority is completed.
    pub fn points(self) -> i64 {
        self.level()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Important => "important",
            Self::Urgent => "urgent",
        }
    }
}

impl TryFrom<i64> for Priority {
    type Error = InvalidTask;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_level(value).ok_or(InvalidTask {
            field: TaskField::Priority,
        })
    }
}

impl From<Priority> for i64 {
    fn from(value: Priority) -> Self {
        value.level()
    }
}

/// Lifecycle state of a stored task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Done { done_at: DateTime<Utc> },
}

/// Persisted task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner: UserId,
    pub title: String,
    pub category: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub status: TaskStatus,
}

impl Task {
    pub fn is_done(&self) -> bool {
        matches!(self.status, TaskStatus::Done { .. })
    }

    pub fn done_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            TaskStatus::Done { done_at } => Some(done_at),
            TaskStatus::Pending => None,
        }
    }
}

/// Submission field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
    Title,
    Category,
    Priority,
}

impl Display for TaskField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Title => "title",
            Self::Category => "category",
            Self::Priority => "priority",
        })
    }
}

/// Validation failure for a task submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid task {field}")]
pub struct InvalidTask {
    pub field: TaskField,
}

/// Validated, not yet persisted task submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub category: String,
    pub priority: Priority,
}

impl NewTask {
    /// Trims text fields and checks all three in field order.
    pub fn validate(title: &str, category: &str, priority: i64) -> Result<Self, InvalidTask> {
        let title = title.trim();
        if title.is_empty() {
            return Err(InvalidTask {
                field: TaskField::Title,
            });
        }
        let category = category.trim();
        if category.is_empty() {
            return Err(InvalidTask {
                field: TaskField::Category,
            });
        }
        let priority = Priority::try_from(priority)?;

        Ok(Self {
            title: title.to_string(),
            category: category.to_string(),
            priority,
        })
    }
}
