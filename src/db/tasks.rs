//! Task record store: create, read, update and soft delete.

use super::cycle::assert_no_cycle;
use super::links::LinkTable;
use super::state_transitions::record_status_transition;
use super::{Database, now_ms, placeholders};
use crate::error::{EngineError, EngineResult};
use crate::types::{
    NewTask, PRIORITY_DEFAULT, Task, TaskId, TaskStatus, TaskUpdate, TaskWithSubtasks,
    validate_priority,
};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params, params_from_iter};
use tracing::{debug, info};

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let status = status.parse::<TaskStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
    })?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        start_date: row.get("start_date")?,
        deadline: row.get("deadline")?,
        status,
        priority: row.get("priority")?,
        recurring: row.get("recurring")?,
        project_id: row.get("project_id")?,
        active: row.get("active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: TaskId) -> EngineResult<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    let result = stmt.query_row(params![task_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load every task whose id is in `ids` with one query. Missing ids are
/// simply absent from the result.
pub(crate) fn get_tasks_by_ids(conn: &Connection, ids: &[TaskId]) -> EngineResult<Vec<Task>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT * FROM tasks WHERE id IN ({}) ORDER BY id",
        placeholders(ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let tasks = stmt
        .query_map(params_from_iter(ids.iter()), parse_task_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

/// Direct active subtasks of `parent_id`, ordered by id.
pub(crate) fn get_subtasks_internal(conn: &Connection, parent_id: TaskId) -> EngineResult<Vec<Task>> {
    let mut stmt = conn.prepare(
        "SELECT t.* FROM tasks t
         INNER JOIN parent_assignment pa ON t.id = pa.subtask_id
         WHERE pa.parent_id = ?1 AND t.active = 1
         ORDER BY t.id",
    )?;
    let tasks = stmt
        .query_map(params![parent_id], parse_task_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub(crate) fn get_task_with_subtasks_internal(
    conn: &Connection,
    task_id: TaskId,
) -> EngineResult<Option<TaskWithSubtasks>> {
    match get_task_internal(conn, task_id)? {
        None => Ok(None),
        Some(task) => {
            let subtasks = get_subtasks_internal(conn, task_id)?;
            Ok(Some(TaskWithSubtasks { task, subtasks }))
        }
    }
}

/// Validate and insert a task row, recording its initial status.
/// Does not link a parent; callers handle `parent_id`.
pub(crate) fn insert_task(conn: &Connection, new: &NewTask) -> EngineResult<Task> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(EngineError::invalid_value("title", "must not be empty"));
    }
    let priority = validate_priority(new.priority.unwrap_or(PRIORITY_DEFAULT))?;
    let status = new.status.unwrap_or_default();
    let now = now_ms();

    conn.execute(
        "INSERT INTO tasks (
            title, description, start_date, deadline, status, priority,
            recurring, project_id, active, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10)",
        params![
            title,
            new.description,
            new.start_date,
            new.deadline,
            status.as_str(),
            priority,
            new.recurring,
            new.project_id,
            now,
            now,
        ],
    )?;
    let id = conn.last_insert_rowid();

    record_status_transition(conn, id, status)?;

    Ok(Task {
        id,
        title: title.to_string(),
        description: new.description.clone(),
        start_date: new.start_date,
        deadline: new.deadline,
        status,
        priority,
        recurring: new.recurring,
        project_id: new.project_id,
        active: true,
        created_at: now,
        updated_at: now,
    })
}

impl Database {
    /// Create a new task.
    /// If `parent_id` is set, the task and its edge are written in one
    /// transaction under the same rules as an explicit attach.
    pub fn create_task(&self, new: NewTask) -> EngineResult<Task> {
        self.with_transaction(|tx| {
            if let Some(parent_id) = new.parent_id {
                let parent = get_task_internal(tx, parent_id)?
                    .ok_or_else(|| EngineError::task_not_found(parent_id))?;
                if !parent.active {
                    return Err(EngineError::inactive_parent(parent_id));
                }
            }

            let task = insert_task(tx, &new)?;

            if let Some(parent_id) = new.parent_id {
                let links = LinkTable::new(tx);
                assert_no_cycle(&links, parent_id, task.id)?;
                links.insert(parent_id, task.id)?;
            }

            info!(task_id = task.id, parent_id = ?new.parent_id, "task created");
            Ok(task)
        })
    }

    /// Get a task by id, active or not.
    pub fn get_task(&self, task_id: TaskId) -> EngineResult<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Get a task by id, treating soft-deleted tasks as absent.
    pub fn get_active_task(&self, task_id: TaskId) -> EngineResult<Option<Task>> {
        Ok(self.get_task(task_id)?.filter(|t| t.active))
    }

    /// Get a task with its direct active subtasks (one level).
    pub fn get_task_with_subtasks(&self, task_id: TaskId) -> EngineResult<Option<TaskWithSubtasks>> {
        debug!(task_id, "loading task with subtasks");
        self.with_conn(|conn| get_task_with_subtasks_internal(conn, task_id))
    }

    /// Update task fields. Status changes go through [`Database::set_task_status`].
    /// Returns `None` for unknown or soft-deleted tasks.
    pub fn update_task(&self, task_id: TaskId, update: TaskUpdate) -> EngineResult<Option<Task>> {
        self.with_transaction(|tx| {
            let task = match get_task_internal(tx, task_id)? {
                Some(task) if task.active => task,
                _ => return Ok(None),
            };

            if update.is_empty() {
                return Ok(Some(task));
            }

            let title = match update.title {
                Some(title) => {
                    let title = title.trim().to_string();
                    if title.is_empty() {
                        return Err(EngineError::invalid_value("title", "must not be empty"));
                    }
                    title
                }
                None => task.title.clone(),
            };
            let priority = match update.priority {
                Some(p) => validate_priority(p)?,
                None => task.priority,
            };

            let updated = Task {
                title,
                description: update.description.unwrap_or(task.description.clone()),
                start_date: update.start_date.unwrap_or(task.start_date),
                deadline: update.deadline.unwrap_or(task.deadline),
                priority,
                recurring: update.recurring.unwrap_or(task.recurring),
                project_id: update.project_id.unwrap_or(task.project_id),
                updated_at: now_ms(),
                ..task
            };

            tx.execute(
                "UPDATE tasks SET title = ?1, description = ?2, start_date = ?3, deadline = ?4,
                    priority = ?5, recurring = ?6, project_id = ?7, updated_at = ?8
                 WHERE id = ?9",
                params![
                    updated.title,
                    updated.description,
                    updated.start_date,
                    updated.deadline,
                    updated.priority,
                    updated.recurring,
                    updated.project_id,
                    updated.updated_at,
                    task_id,
                ],
            )?;

            debug!(task_id, "task updated");
            Ok(Some(updated))
        })
    }

    /// Soft-delete a task. With `detach_links`, every edge where the task is
    /// parent and every edge where it is child are removed first. Subtasks
    /// stay active. Unknown or already-deleted tasks are `NotFound`.
    pub fn delete_task(&self, task_id: TaskId, detach_links: bool) -> EngineResult<Task> {
        self.with_transaction(|tx| {
            let task = get_task_internal(tx, task_id)?
                .filter(|t| t.active)
                .ok_or_else(|| EngineError::task_not_found(task_id))?;

            if detach_links {
                let links = LinkTable::new(tx);
                let as_parent = links.delete_as_parent(task_id)?;
                let as_child = links.delete_as_child(task_id)?;
                debug!(task_id, as_parent, as_child, "links detached before delete");
            }

            let now = now_ms();
            soft_delete(tx, task_id, now)?;

            info!(task_id, detach_links, "task deleted");
            Ok(Task {
                active: false,
                updated_at: now,
                ..task
            })
        })
    }
}

/// Mark a task inactive. The row and its history persist.
pub(crate) fn soft_delete(conn: &Connection, task_id: TaskId, now: i64) -> EngineResult<()> {
    conn.execute(
        "UPDATE tasks SET active = 0, updated_at = ?1 WHERE id = ?2",
        params![now, task_id],
    )?;
    Ok(())
}
