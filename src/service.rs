//! Caller-side task service.
//!
//! Wraps [`Database`] operations, fills configured defaults, and reports each
//! committed change to a [`TaskNotifier`]. Notifier failures are logged and
//! swallowed here; the engine's committed state is never affected.

use crate::config::TasksConfig;
use crate::db::Database;
use crate::error::EngineResult;
use crate::notify::{ChangeKind, NoopNotifier, TaskChange, TaskNotifier};
use crate::types::{
    LinkCounts, ListOptions, NewTask, StatusHistoryEntry, StatusTransition, Task, TaskId,
    TaskSort, TaskStatus, TaskUpdate, TaskWithSubtasks,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct TaskService {
    db: Database,
    notifier: Arc<dyn TaskNotifier>,
    defaults: TasksConfig,
}

impl TaskService {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            notifier: Arc::new(NoopNotifier),
            defaults: TasksConfig::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn TaskNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_defaults(mut self, defaults: TasksConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    fn notify(&self, change: TaskChange) {
        if let Err(e) = self.notifier.task_changed(&change) {
            warn!(
                task_id = change.task_id,
                kind = ?change.kind,
                error = %e,
                "task change notification failed"
            );
        }
    }

    fn notify_subtasks(&self, parent: &Task, kind: ChangeKind, before: &[TaskId], after: &[TaskId]) {
        if before != after {
            self.notify(TaskChange::new(parent, kind).with_value("subtasks", json!(before), json!(after)));
        }
    }

    pub fn create_task(&self, mut new: NewTask) -> EngineResult<Task> {
        new.priority.get_or_insert(self.defaults.default_priority);
        let parent_id = new.parent_id;

        let task = self.db.create_task(new)?;

        let mut change = TaskChange::new(&task, ChangeKind::Created)
            .with_value("status", Value::Null, json!(task.status));
        if let Some(parent_id) = parent_id {
            change = change.with_value("parent_id", Value::Null, json!(parent_id));
        }
        self.notify(change);
        Ok(task)
    }

    pub fn get_task(&self, task_id: TaskId) -> EngineResult<Option<Task>> {
        self.db.get_task(task_id)
    }

    pub fn get_task_with_subtasks(&self, task_id: TaskId) -> EngineResult<Option<TaskWithSubtasks>> {
        self.db.get_task_with_subtasks(task_id)
    }

    pub fn update_task(&self, task_id: TaskId, update: TaskUpdate) -> EngineResult<Option<Task>> {
        let before = self.db.get_active_task(task_id)?;
        let after = self.db.update_task(task_id, update)?;

        if let (Some(before), Some(after)) = (&before, &after) {
            let change = TaskChange::diff(before, after, ChangeKind::Updated);
            if !change.is_empty() {
                self.notify(change);
            }
        }
        Ok(after)
    }

    pub fn attach_subtasks(&self, parent_id: TaskId, child_ids: &[TaskId]) -> EngineResult<TaskWithSubtasks> {
        let before = self.db.subtask_ids(parent_id)?;
        let parent = self.db.attach_subtasks(parent_id, child_ids)?;
        let after = self.db.subtask_ids(parent_id)?;

        self.notify_subtasks(&parent.task, ChangeKind::SubtasksAttached, &before, &after);
        Ok(parent)
    }

    pub fn detach_subtask(&self, parent_id: TaskId, subtask_id: TaskId) -> EngineResult<bool> {
        let before = self.db.subtask_ids(parent_id)?;
        let detached = self.db.detach_subtask(parent_id, subtask_id)?;

        if let Some(parent) = self.db.get_task(parent_id)? {
            let after = self.db.subtask_ids(parent_id)?;
            self.notify_subtasks(&parent, ChangeKind::SubtaskDetached, &before, &after);
        }
        Ok(detached)
    }

    /// Soft-delete a task; also returns how many edges it had beforehand.
    pub fn delete_task(&self, task_id: TaskId, detach_links: bool) -> EngineResult<(Task, LinkCounts)> {
        let counts = self.db.link_counts(task_id)?;
        let task = self.db.delete_task(task_id, detach_links)?;

        let mut change = TaskChange::new(&task, ChangeKind::Deleted)
            .with_value("active", json!(true), json!(false));
        if detach_links && counts.total() > 0 {
            change = change.with_value("links", json!(counts), json!(LinkCounts::default()));
        }
        self.notify(change);
        Ok((task, counts))
    }

    pub fn set_task_status(&self, task_id: TaskId, status: TaskStatus) -> EngineResult<StatusTransition> {
        let transition = self.db.set_task_status(task_id, status)?;

        if transition.previous_status != transition.task.status {
            self.notify(TaskChange::new(&transition.task, ChangeKind::StatusChanged).with_value(
                "status",
                json!(transition.previous_status),
                json!(transition.task.status),
            ));
        }
        if let Some(ref next) = transition.next_occurrence {
            self.notify(
                TaskChange::new(next, ChangeKind::Created)
                    .with_value("status", Value::Null, json!(next.status))
                    .with_value("recurs_from", Value::Null, json!(transition.task.id)),
            );
        }
        Ok(transition)
    }

    /// Transition using a status label; unknown labels are `InvalidArgument`.
    pub fn set_task_status_label(&self, task_id: TaskId, label: &str) -> EngineResult<StatusTransition> {
        self.set_task_status(task_id, label.parse()?)
    }

    pub fn start_task(&self, task_id: TaskId) -> EngineResult<StatusTransition> {
        self.set_task_status(task_id, TaskStatus::InProgress)
    }

    pub fn complete_task(&self, task_id: TaskId) -> EngineResult<StatusTransition> {
        self.set_task_status(task_id, TaskStatus::Completed)
    }

    pub fn mark_blocked(&self, task_id: TaskId) -> EngineResult<StatusTransition> {
        self.set_task_status(task_id, TaskStatus::Blocked)
    }

    pub fn reopen_task(&self, task_id: TaskId) -> EngineResult<StatusTransition> {
        self.set_task_status(task_id, TaskStatus::Todo)
    }

    pub fn list_parent_tasks(&self, options: &ListOptions) -> EngineResult<Vec<Task>> {
        self.db.list_parent_tasks(options)
    }

    /// Sort applied to root listings that do not request one.
    pub fn default_sort(&self) -> TaskSort {
        self.defaults.default_sort
    }

    pub fn get_status_history(&self, task_id: TaskId) -> EngineResult<Vec<StatusHistoryEntry>> {
        self.db.get_status_history(task_id)
    }

    pub fn link_counts(&self, task_id: TaskId) -> EngineResult<LinkCounts> {
        self.db.link_counts(task_id)
    }
}
