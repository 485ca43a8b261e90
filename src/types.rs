//! Core types for the task hierarchy engine.

use crate::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task identity (SQLite rowid).
pub type TaskId = i64;

/// Task priority: a small positive integer, higher = more important.
pub type Priority = i32;

pub const PRIORITY_MIN: Priority = 1;
pub const PRIORITY_MAX: Priority = 10;
pub const PRIORITY_DEFAULT: Priority = 5;

/// Reject priorities outside `PRIORITY_MIN..=PRIORITY_MAX`.
pub fn validate_priority(priority: Priority) -> EngineResult<Priority> {
    if (PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
        Ok(priority)
    } else {
        Err(EngineError::invalid_value(
            "priority",
            format!(
                "must be between {} and {}, got {}",
                PRIORITY_MIN, PRIORITY_MAX, priority
            ),
        ))
    }
}

/// Task status. Any status may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To-do")]
    Todo,
    #[serde(rename = "In-progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Blocked")]
    Blocked,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To-do",
            TaskStatus::InProgress => "In-progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| EngineError::invalid_status(s))
    }
}

/// A task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub status: TaskStatus,
    pub priority: Priority,
    /// 0 = one-off, N > 0 = days until the next occurrence.
    pub recurring: u32,
    pub project_id: Option<i64>,
    pub active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task together with its direct (one level) subtasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWithSubtasks {
    #[serde(flatten)]
    pub task: Task,
    pub subtasks: Vec<Task>,
}

impl TaskWithSubtasks {
    pub fn subtask_ids(&self) -> Vec<TaskId> {
        self.subtasks.iter().map(|t| t.id).collect()
    }
}

/// Fields for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    /// Defaults to `To-do`.
    pub status: Option<TaskStatus>,
    /// Defaults to [`PRIORITY_DEFAULT`].
    pub priority: Option<Priority>,
    #[serde(default)]
    pub recurring: u32,
    pub project_id: Option<i64>,
    /// Link the new task under this parent in the same transaction.
    pub parent_id: Option<TaskId>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_recurring(mut self, days: u32) -> Self {
        self.recurring = days;
        self
    }

    pub fn with_project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// The successor of a completed recurring task: same content, shifted
    /// one period forward from the old deadline, back to `To-do`.
    pub fn next_occurrence(task: &Task) -> EngineResult<Self> {
        let deadline = task.deadline.ok_or_else(|| {
            EngineError::invalid_state("cannot create next occurrence without a deadline")
        })?;
        let next_deadline = deadline
            .checked_add_days(chrono::Days::new(u64::from(task.recurring)))
            .ok_or_else(|| EngineError::invalid_state("next occurrence deadline out of range"))?;

        Ok(Self {
            title: task.title.clone(),
            description: task.description.clone(),
            start_date: Some(deadline),
            deadline: Some(next_deadline),
            status: Some(TaskStatus::Todo),
            priority: Some(task.priority),
            recurring: task.recurring,
            project_id: task.project_id,
            parent_id: None,
        })
    }
}

/// Partial update of a task. `None` leaves a field untouched; for nullable
/// fields `Some(None)` clears the value. Status and `active` are not here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<Option<NaiveDate>>,
    pub deadline: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub recurring: Option<u32>,
    pub project_id: Option<Option<i64>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self == &TaskUpdate::default()
    }
}

/// A parent -> subtask edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentLink {
    pub parent_id: TaskId,
    pub subtask_id: TaskId,
    pub created_at: i64,
}

/// How many edges touch a task, per direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCounts {
    pub as_parent: usize,
    pub as_child: usize,
}

impl LinkCounts {
    pub fn total(&self) -> usize {
        self.as_parent + self.as_child
    }
}

/// Outcome of a status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub task: Task,
    pub previous_status: TaskStatus,
    /// Set when completing a recurring task spawned its successor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_occurrence: Option<Task>,
}

/// One row of a task's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub timestamp: i64,
    pub end_timestamp: Option<i64>,
}

/// Single filter applied to a root listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    Priority(Priority),
    PriorityRange(Priority, Priority),
    Status(TaskStatus),
    CreatedAfter(NaiveDate),
    CreatedBefore(NaiveDate),
    DueAfter(NaiveDate),
    DueBefore(NaiveDate),
    StartAfter(NaiveDate),
    StartBefore(NaiveDate),
}

/// Ordering of a root listing. Every ordering ends with `id ASC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    /// Deadline soonest first, tasks without a deadline last.
    #[default]
    DeadlineAsc,
    DeadlineDesc,
    PriorityDesc,
    PriorityAsc,
    StartDateAsc,
    StartDateDesc,
    Status,
}

impl TaskSort {
    pub const ALL: [TaskSort; 7] = [
        TaskSort::DeadlineAsc,
        TaskSort::DeadlineDesc,
        TaskSort::PriorityDesc,
        TaskSort::PriorityAsc,
        TaskSort::StartDateAsc,
        TaskSort::StartDateDesc,
        TaskSort::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskSort::DeadlineAsc => "deadline_asc",
            TaskSort::DeadlineDesc => "deadline_desc",
            TaskSort::PriorityDesc => "priority_desc",
            TaskSort::PriorityAsc => "priority_asc",
            TaskSort::StartDateAsc => "start_date_asc",
            TaskSort::StartDateDesc => "start_date_desc",
            TaskSort::Status => "status",
        }
    }
}

impl FromStr for TaskSort {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskSort::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s)
            .ok_or_else(|| EngineError::invalid_value("sort", format!("unknown sort '{}'", s)))
    }
}

/// Options for [`crate::db::Database::list_parent_tasks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub active_only: bool,
    pub project_id: Option<i64>,
    pub filter: Option<TaskFilter>,
    pub sort: TaskSort,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            active_only: true,
            project_id: None,
            filter: None,
            sort: TaskSort::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn status_labels_parse_exactly() {
        assert_eq!("To-do".parse::<TaskStatus>().unwrap(), TaskStatus::Todo);
        assert_eq!("In-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("Blocked".parse::<TaskStatus>().unwrap(), TaskStatus::Blocked);

        let err = "done".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidArgument);
        assert!("completed".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn status_serializes_as_label() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"In-progress\"");
    }

    #[test]
    fn priority_bounds() {
        assert!(validate_priority(1).is_ok());
        assert!(validate_priority(10).is_ok());
        assert!(validate_priority(0).is_err());
        assert!(validate_priority(11).is_err());
    }

    #[test]
    fn sort_names_round_trip() {
        for sort in TaskSort::ALL {
            assert_eq!(sort.as_str().parse::<TaskSort>().unwrap(), sort);
        }
        assert!("random".parse::<TaskSort>().is_err());
    }

    #[test]
    fn next_occurrence_shifts_by_period() {
        let task = Task {
            id: 100,
            title: "Recurring Task".into(),
            description: Some("desc".into()),
            start_date: Some(date(2025, 10, 1)),
            deadline: Some(date(2025, 10, 11)),
            status: TaskStatus::Todo,
            priority: 4,
            recurring: 7,
            project_id: Some(42),
            active: true,
            created_at: 0,
            updated_at: 0,
        };

        let next = NewTask::next_occurrence(&task).unwrap();
        assert_eq!(next.start_date, Some(date(2025, 10, 11)));
        assert_eq!(next.deadline, Some(date(2025, 10, 18)));
        assert_eq!(next.status, Some(TaskStatus::Todo));
        assert_eq!(next.priority, Some(4));
        assert_eq!(next.recurring, 7);
        assert_eq!(next.project_id, Some(42));
        assert_eq!(next.parent_id, None);
    }

    #[test]
    fn next_occurrence_requires_deadline() {
        let task = Task {
            id: 1,
            title: "No deadline".into(),
            description: None,
            start_date: None,
            deadline: None,
            status: TaskStatus::Todo,
            priority: 5,
            recurring: 5,
            project_id: None,
            active: true,
            created_at: 0,
            updated_at: 0,
        };
        let err = NewTask::next_occurrence(&task).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidState);
    }

    #[test]
    fn empty_update_detected() {
        assert!(TaskUpdate::default().is_empty());
        let update = TaskUpdate {
            deadline: Some(None),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
