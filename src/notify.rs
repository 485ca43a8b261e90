//! Task change notifications.
//!
//! The engine never calls a notifier itself. [`crate::service::TaskService`]
//! reports each committed change to a [`TaskNotifier`] after the engine
//! returns, so a failing notifier cannot roll back engine state.

use crate::types::{Task, TaskId};
use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Mutex;
use tracing::info;

/// Category of a committed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A task was created, directly or as a recurring occurrence.
    Created,
    /// Plain fields were updated.
    Updated,
    /// The status changed.
    StatusChanged,
    /// One or more subtasks were linked under the task.
    SubtasksAttached,
    /// A subtask was unlinked from the task.
    SubtaskDetached,
    /// The task was soft-deleted.
    Deleted,
}

// Bookkeeping fields that change on every write.
const IGNORED_FIELDS: [&str; 2] = ["created_at", "updated_at"];

/// Payload describing one committed change to one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskChange {
    pub task_id: TaskId,
    pub title: String,
    pub kind: ChangeKind,
    pub updated_fields: Vec<String>,
    pub previous_values: Map<String, Value>,
    pub new_values: Map<String, Value>,
}

impl TaskChange {
    pub fn new(task: &Task, kind: ChangeKind) -> Self {
        Self {
            task_id: task.id,
            title: task.title.clone(),
            kind,
            updated_fields: Vec::new(),
            previous_values: Map::new(),
            new_values: Map::new(),
        }
    }

    /// Record one field's old and new value.
    pub fn with_value(mut self, field: &str, previous: Value, new: Value) -> Self {
        self.updated_fields.push(field.to_string());
        self.previous_values.insert(field.to_string(), previous);
        self.new_values.insert(field.to_string(), new);
        self
    }

    /// Field-by-field difference between two snapshots of the same task.
    pub fn diff(before: &Task, after: &Task, kind: ChangeKind) -> Self {
        let mut change = Self::new(after, kind);
        let (Ok(Value::Object(old)), Ok(Value::Object(new))) =
            (serde_json::to_value(before), serde_json::to_value(after))
        else {
            return change;
        };

        for (field, new_value) in new {
            if IGNORED_FIELDS.contains(&field.as_str()) {
                continue;
            }
            let old_value = old.get(&field).cloned().unwrap_or(Value::Null);
            if old_value != new_value {
                change = change.with_value(&field, old_value, new_value);
            }
        }
        change
    }

    pub fn is_empty(&self) -> bool {
        self.updated_fields.is_empty()
    }
}

/// Receiver of committed task changes.
pub trait TaskNotifier: Send + Sync {
    fn task_changed(&self, change: &TaskChange) -> Result<()>;
}

/// Discards every change.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl TaskNotifier for NoopNotifier {
    fn task_changed(&self, _change: &TaskChange) -> Result<()> {
        Ok(())
    }
}

/// Writes every change as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl TaskNotifier for LogNotifier {
    fn task_changed(&self, change: &TaskChange) -> Result<()> {
        info!(
            task_id = change.task_id,
            title = %change.title,
            kind = ?change.kind,
            fields = ?change.updated_fields,
            "task changed"
        );
        Ok(())
    }
}

/// Keeps every change in memory until taken.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    changes: Mutex<Vec<TaskChange>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the collected changes, oldest first.
    pub fn take(&self) -> Vec<TaskChange> {
        match self.changes.lock() {
            Ok(mut changes) => std::mem::take(&mut *changes),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl TaskNotifier for CollectingNotifier {
    fn task_changed(&self, change: &TaskChange) -> Result<()> {
        self.changes
            .lock()
            .map_err(|_| anyhow::anyhow!("notifier lock poisoned"))?
            .push(change.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskStatus;
    use serde_json::json;

    fn task() -> Task {
        Task {
            id: 1,
            title: "Write report".into(),
            description: None,
            start_date: None,
            deadline: None,
            status: TaskStatus::Todo,
            priority: 5,
            recurring: 0,
            project_id: None,
            active: true,
            created_at: 10,
            updated_at: 10,
        }
    }

    #[test]
    fn diff_lists_only_changed_fields() {
        let before = task();
        let after = Task {
            priority: 8,
            status: TaskStatus::Blocked,
            updated_at: 99,
            ..before.clone()
        };

        let change = TaskChange::diff(&before, &after, ChangeKind::Updated);
        let mut fields = change.updated_fields.clone();
        fields.sort();
        assert_eq!(fields, vec!["priority", "status"]);
        assert_eq!(change.previous_values["priority"], json!(5));
        assert_eq!(change.new_values["status"], json!("Blocked"));
    }

    #[test]
    fn diff_of_identical_tasks_is_empty() {
        let t = task();
        assert!(TaskChange::diff(&t, &t, ChangeKind::Updated).is_empty());
    }

    #[test]
    fn collecting_notifier_drains() {
        let notifier = CollectingNotifier::new();
        let change = TaskChange::new(&task(), ChangeKind::Created);
        notifier.task_changed(&change).unwrap();
        notifier.task_changed(&change).unwrap();

        assert_eq!(notifier.take().len(), 2);
        assert!(notifier.take().is_empty());
    }
}
