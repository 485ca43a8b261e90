//! Status state machine and recurrence.
//!
//! Any status may move to any other. Completing a recurring task spawns its
//! next occurrence in the same transaction; if that is impossible (no
//! deadline) the status change is not committed either.

use super::state_transitions::record_status_transition;
use super::tasks::{get_task_internal, insert_task};
use super::{Database, now_ms};
use crate::error::{EngineError, EngineResult};
use crate::types::{NewTask, StatusTransition, Task, TaskId, TaskStatus};
use rusqlite::params;
use tracing::{debug, info};

impl Database {
    /// Move a task to `status`.
    ///
    /// Re-completing a task that is already `Completed` is a no-op, so a
    /// retried completion never spawns a second occurrence.
    pub fn set_task_status(&self, task_id: TaskId, status: TaskStatus) -> EngineResult<StatusTransition> {
        self.with_transaction(|tx| {
            let task = get_task_internal(tx, task_id)?
                .ok_or_else(|| EngineError::task_not_found(task_id))?;
            if !task.active {
                return Err(EngineError::inactive_tasks(&[task_id]));
            }

            let previous_status = task.status;
            if previous_status == status {
                debug!(task_id, %status, "status unchanged");
                return Ok(StatusTransition {
                    task,
                    previous_status,
                    next_occurrence: None,
                });
            }

            // Validate the successor before writing anything.
            let successor = if status == TaskStatus::Completed && task.recurring > 0 {
                Some(NewTask::next_occurrence(&task)?)
            } else {
                None
            };

            let now = now_ms();
            tx.execute(
                "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now, task_id],
            )?;
            record_status_transition(tx, task_id, status)?;

            let next_occurrence = match successor {
                Some(new) => {
                    let next = insert_task(tx, &new)?;
                    info!(task_id, next_id = next.id, deadline = ?next.deadline, "next occurrence created");
                    Some(next)
                }
                None => None,
            };

            info!(task_id, from = %previous_status, to = %status, "status changed");
            Ok(StatusTransition {
                task: Task {
                    status,
                    updated_at: now,
                    ..task
                },
                previous_status,
                next_occurrence,
            })
        })
    }

    /// Parse a status label, then transition.
    pub fn set_task_status_label(&self, task_id: TaskId, label: &str) -> EngineResult<StatusTransition> {
        let status = label.parse::<TaskStatus>()?;
        self.set_task_status(task_id, status)
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
}
