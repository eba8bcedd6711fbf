//! Transport-boundary helpers: the task message format and button action
//! tokens.
//!
//! A task message is three lines:
//!
//! ```text
//! Buy milk
//! #errands
//! 1
//! ```
//!
//! Action tokens have the shape `<verb>:<task_id>` with verb `done` or
//! `delete`.

use crate::model::task::{InvalidTask, TaskField, TaskId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static TAG_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s*(?P<category>.*)$").expect("valid tag regex"));
static PRIORITY_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("valid priority regex"));

/// Fields extracted from a task message, not yet validated by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub category: String,
    pub priority: i64,
}

/// Splits a free-text task message into title, category and priority.
///
/// Blank lines are ignored. The remaining lines must be exactly a title, one
/// `#tag` line and one priority line; range checks are left to
/// [`crate::model::task::NewTask::validate`].
pub fn parse_task_message(text: &str) -> Result<TaskDraft, InvalidTask> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let (title, rest) = match lines.split_first() {
        Some((line, rest)) if !line.starts_with('#') => ((*line).to_string(), rest),
        _ => return Err(invalid(TaskField::Title)),
    };

    let tag_lines = rest.iter().filter(|line| TAG_LINE_RE.is_match(line)).count();
    let category = rest
        .first()
        .and_then(|line| TAG_LINE_RE.captures(line))
        .map(|caps| caps["category"].trim().to_string())
        .filter(|category| tag_lines == 1 && !category.is_empty())
        .ok_or_else(|| invalid(TaskField::Category))?;

    let priority = match rest.get(1..) {
        Some([line]) if PRIORITY_LINE_RE.is_match(line) => line.parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| invalid(TaskField::Priority))?;

    Ok(TaskDraft {
        title,
        category,
        priority,
    })
}

fn invalid(field: TaskField) -> InvalidTask {
    InvalidTask { field }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionVerb {
    Done,
    Delete,
}

impl ActionVerb {
    fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Delete => "delete",
        }
    }
}

/// A button interaction targeting one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub verb: ActionVerb,
    pub task_id: TaskId,
}

impl Action {
    pub fn done(task_id: TaskId) -> Self {
        Self {
            verb: ActionVerb::Done,
            task_id,
        }
    }

    pub fn delete(task_id: TaskId) -> Self {
        Self {
            verb: ActionVerb::Delete,
            task_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionParseError {
    #[error("action token `{0}` is not of the form <verb>:<task_id>")]
    Malformed(String),
    #[error("unknown action verb `{0}`")]
    UnknownVerb(String),
    #[error("invalid task id `{0}`")]
    InvalidTaskId(String),
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (verb, task_id) = token
            .trim()
            .split_once(':')
            .ok_or_else(|| ActionParseError::Malformed(token.to_string()))?;

        let verb = match verb {
            "done" => ActionVerb::Done,
            "delete" => ActionVerb::Delete,
            other => return Err(ActionParseError::UnknownVerb(other.to_string())),
        };
        let task_id = task_id
            .parse::<TaskId>()
            .map_err(|_| ActionParseError::InvalidTaskId(task_id.to_string()))?;

        Ok(Self { verb, task_id })
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.verb.as_str(), self.task_id)
    }
}

/// Parses a `<verb>:<task_id>` button token.
pub fn parse_action(token: &str) -> Result<Action, ActionParseError> {
    token.parse()
}

#[cfg(test)]
mod tests {
    use super::{parse_action, parse_task_message, Action, ActionParseError, ActionVerb};
    use crate::model::task::{TaskField, TaskId};

    #[test]
    fn parses_three_line_message() {
        let draft = parse_task_message("Buy milk\n#errands\n1").unwrap();
        assert_eq!(draft.title, "Buy milk");
        assert_eq!(draft.category, "errands");
        assert_eq!(draft.priority, 1);
    }

    #[test]
    fn tolerates_blank_lines_and_padding() {
        let draft = parse_task_message("\n  Write report \n\n # work \n 3 \n").unwrap();
        assert_eq!(draft.title, "Write report");
        assert_eq!(draft.category, "work");
        assert_eq!(draft.priority, 3);
    }

    #[test]
    fn reports_failing_field() {
        assert_eq!(
            parse_task_message("#errands\n1").unwrap_err().field,
            TaskField::Title
        );
        assert_eq!(
            parse_task_message("Buy milk\nerrands\n1").unwrap_err().field,
            TaskField::Category
        );
        assert_eq!(
            parse_task_message("Buy milk\n#\n1").unwrap_err().field,
            TaskField::Category
        );
        assert_eq!(
            parse_task_message("Buy milk\n#a\n#b\n1").unwrap_err().field,
            TaskField::Category
        );
        assert_eq!(
            parse_task_message("Buy milk\n#errands\nsoon").unwrap_err().field,
            TaskField::Priority
        );
    }

    #[test]
    fn extra_lines_after_the_tag_are_rejected() {
        assert_eq!(
            parse_task_message("Buy milk\n#x\n1\n3").unwrap_err().field,
            TaskField::Priority
        );
        assert_eq!(
            parse_task_message("Buy milk\n#x\nfresh\n3").unwrap_err().field,
            TaskField::Priority
        );
        assert_eq!(
            parse_task_message("Buy milk\n#errands").unwrap_err().field,
            TaskField::Priority
        );
        assert_eq!(
            parse_task_message("Buy milk\nfresh\n#x\n3").unwrap_err().field,
            TaskField::Category
        );
    }

    #[test]
    fn out_of_range_priority_is_left_to_validation() {
        let draft = parse_task_message("Buy milk\n#errands\n7").unwrap();
        assert_eq!(draft.priority, 7);
    }

    #[test]
    fn action_token_roundtrips_through_display() {
        let id = TaskId::new();
        let action = parse_action(&Action::delete(id).to_string()).unwrap();
        assert_eq!(action.verb, ActionVerb::Delete);
        assert_eq!(action.task_id, id);
    }

    #[test]
    fn rejects_bad_tokens() {
        assert!(matches!(
            parse_action("done"),
            Err(ActionParseError::Malformed(_))
        ));
        assert!(matches!(
            parse_action(&format!("open:{}", TaskId::new())),
            Err(ActionParseError::UnknownVerb(verb)) if verb == "open"
        ));
        assert!(matches!(
            parse_action("done:42"),
            Err(ActionParseError::InvalidTaskId(_))
        ));
    }
}
