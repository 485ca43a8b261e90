//! Parent-link table and the attach/detach protocol.

use super::cycle::{EdgeSource, assert_no_cycle};
use super::tasks::{get_task_internal, get_tasks_by_ids, get_task_with_subtasks_internal};
use super::{Database, now_ms, placeholders};
use crate::error::{EngineError, EngineResult};
use crate::types::{LinkCounts, ParentLink, TaskId, TaskWithSubtasks};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::collections::HashSet;
use tracing::{debug, info};

fn parse_link_row(row: &Row) -> rusqlite::Result<ParentLink> {
    Ok(ParentLink {
        parent_id: row.get("parent_id")?,
        subtask_id: row.get("subtask_id")?,
        created_at: row.get("created_at")?,
    })
}

/// Edge repository over a borrowed connection or transaction.
pub struct LinkTable<'c> {
    conn: &'c Connection,
}

impl<'c> LinkTable<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert one edge. Uniqueness violations surface as `Conflict`.
    pub fn insert(&self, parent_id: TaskId, subtask_id: TaskId) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO parent_assignment (parent_id, subtask_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![parent_id, subtask_id, now_ms()],
        )?;
        Ok(())
    }

    /// Delete one edge. Returns whether it existed.
    pub fn delete(&self, parent_id: TaskId, subtask_id: TaskId) -> EngineResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM parent_assignment WHERE parent_id = ?1 AND subtask_id = ?2",
            params![parent_id, subtask_id],
        )?;
        Ok(removed > 0)
    }

    pub fn exists(&self, parent_id: TaskId, subtask_id: TaskId) -> EngineResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM parent_assignment WHERE parent_id = ?1 AND subtask_id = ?2",
                params![parent_id, subtask_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// The parent of `subtask_id`, if linked.
    pub fn parent_of(&self, subtask_id: TaskId) -> EngineResult<Option<TaskId>> {
        let parent = self
            .conn
            .query_row(
                "SELECT parent_id FROM parent_assignment WHERE subtask_id = ?1",
                params![subtask_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(parent)
    }

    pub fn subtask_ids(&self, parent_id: TaskId) -> EngineResult<Vec<TaskId>> {
        let mut stmt = self.conn.prepare(
            "SELECT subtask_id FROM parent_assignment WHERE parent_id = ?1 ORDER BY subtask_id",
        )?;
        let ids = stmt
            .query_map(params![parent_id], |row| row.get(0))?
            .collect::<Result<Vec<TaskId>, _>>()?;
        Ok(ids)
    }

    /// Existing edges whose child end is any of `subtask_ids`.
    pub fn links_for_subtasks(&self, subtask_ids: &[TaskId]) -> EngineResult<Vec<ParentLink>> {
        if subtask_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT parent_id, subtask_id, created_at FROM parent_assignment
             WHERE subtask_id IN ({})",
            placeholders(subtask_ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let links = stmt
            .query_map(params_from_iter(subtask_ids.iter()), parse_link_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }

    /// Remove every edge where `task_id` is the parent.
    pub fn delete_as_parent(&self, task_id: TaskId) -> EngineResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM parent_assignment WHERE parent_id = ?1",
            params![task_id],
        )?)
    }

    /// Remove every edge where `task_id` is the child.
    pub fn delete_as_child(&self, task_id: TaskId) -> EngineResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM parent_assignment WHERE subtask_id = ?1",
            params![task_id],
        )?)
    }

    pub fn counts(&self, task_id: TaskId) -> EngineResult<LinkCounts> {
        let (as_parent, as_child): (i64, i64) = self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM parent_assignment WHERE parent_id = ?1),
                (SELECT COUNT(*) FROM parent_assignment WHERE subtask_id = ?1)",
            params![task_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(LinkCounts {
            as_parent: usize::try_from(as_parent).map_err(EngineError::internal)?,
            as_child: usize::try_from(as_child).map_err(EngineError::internal)?,
        })
    }
}

impl EdgeSource for LinkTable<'_> {
    fn subtasks_of(&self, parent_id: TaskId) -> EngineResult<Vec<TaskId>> {
        self.subtask_ids(parent_id)
    }
}

/// Drop repeated ids, keeping first-occurrence order.
fn dedupe(ids: &[TaskId]) -> Vec<TaskId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

impl Database {
    /// Attach subtasks to a parent, all or nothing.
    ///
    /// Every requested child is validated (exists, active, no other parent,
    /// no cycle) before any edge is written. Edges that already exist to
    /// this parent are skipped. Returns the parent with its direct subtasks.
    pub fn attach_subtasks(
        &self,
        parent_id: TaskId,
        child_ids: &[TaskId],
    ) -> EngineResult<TaskWithSubtasks> {
        self.with_transaction(|tx| {
            let parent = get_task_internal(tx, parent_id)?
                .ok_or_else(|| EngineError::task_not_found(parent_id))?;
            if !parent.active {
                return Err(EngineError::inactive_parent(parent_id));
            }

            let ids = dedupe(child_ids);
            if ids.is_empty() {
                return get_task_with_subtasks_internal(tx, parent_id)?
                    .ok_or_else(|| EngineError::task_not_found(parent_id));
            }

            if ids.contains(&parent_id) {
                return Err(EngineError::self_reference(parent_id));
            }

            let children = get_tasks_by_ids(tx, &ids)?;
            let found: HashSet<TaskId> = children.iter().map(|t| t.id).collect();
            let missing: Vec<TaskId> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
            if !missing.is_empty() {
                return Err(EngineError::tasks_not_found(&missing));
            }

            let inactive: Vec<TaskId> = children.iter().filter(|t| !t.active).map(|t| t.id).collect();
            if !inactive.is_empty() {
                return Err(EngineError::inactive_tasks(&inactive));
            }

            let links = LinkTable::new(tx);
            let existing = links.links_for_subtasks(&ids)?;

            let conflicts: Vec<TaskId> = existing
                .iter()
                .filter(|link| link.parent_id != parent_id)
                .map(|link| link.subtask_id)
                .collect();
            if !conflicts.is_empty() {
                return Err(EngineError::already_has_parent(&conflicts));
            }

            let already: HashSet<TaskId> = existing.iter().map(|link| link.subtask_id).collect();
            let queued: Vec<TaskId> = ids.into_iter().filter(|id| !already.contains(id)).collect();

            for &child_id in &queued {
                assert_no_cycle(&links, parent_id, child_id)?;
            }

            for &child_id in &queued {
                links.insert(parent_id, child_id)?;
            }

            if queued.is_empty() {
                debug!(parent_id, "attach: all subtasks already linked");
            } else {
                info!(parent_id, subtasks = ?queued, "subtasks attached");
            }

            get_task_with_subtasks_internal(tx, parent_id)?
                .ok_or_else(|| EngineError::task_not_found(parent_id))
        })
    }

    /// Remove the edge `parent_id -> subtask_id`. Task fields are untouched.
    pub fn detach_subtask(&self, parent_id: TaskId, subtask_id: TaskId) -> EngineResult<bool> {
        self.with_transaction(|tx| {
            let links = LinkTable::new(tx);
            if !links.exists(parent_id, subtask_id)? {
                return Err(EngineError::link_not_found(parent_id, subtask_id));
            }

            let endpoints = get_tasks_by_ids(tx, &[parent_id, subtask_id])?;
            let inactive: Vec<TaskId> = endpoints.iter().filter(|t| !t.active).map(|t| t.id).collect();
            if !inactive.is_empty() {
                return Err(EngineError::inactive_tasks(&inactive));
            }

            links.delete(parent_id, subtask_id)?;
            info!(parent_id, subtask_id, "subtask detached");
            Ok(true)
        })
    }

    /// Edge counts for a task, e.g. before deleting it.
    pub fn link_counts(&self, task_id: TaskId) -> EngineResult<LinkCounts> {
        self.with_conn(|conn| LinkTable::new(conn).counts(task_id))
    }

    pub fn parent_of(&self, task_id: TaskId) -> EngineResult<Option<TaskId>> {
        self.with_conn(|conn| LinkTable::new(conn).parent_of(task_id))
    }

    pub fn subtask_ids(&self, task_id: TaskId) -> EngineResult<Vec<TaskId>> {
        self.with_conn(|conn| LinkTable::new(conn).subtask_ids(task_id))
    }

    /// Every edge in the table.
    pub fn get_all_links(&self) -> EngineResult<Vec<ParentLink>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT parent_id, subtask_id, created_at FROM parent_assignment
                 ORDER BY parent_id, subtask_id",
            )?;
            let links = stmt
                .query_map([], parse_link_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(links)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keeps_first_occurrence_order() {
        assert_eq!(dedupe(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(dedupe(&[]).is_empty());
    }
}
