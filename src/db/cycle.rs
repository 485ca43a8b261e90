//! Cycle guard for parent/subtask edges.
//!
//! Pure traversal over an [`EdgeSource`], so it can run against the live
//! link table inside a transaction or against an in-memory edge list.

use crate::error::{EngineError, EngineResult};
use crate::types::{ParentLink, TaskId};
use std::collections::{HashSet, VecDeque};

/// Read-only view of the parent -> subtask edge set.
pub trait EdgeSource {
    /// Direct subtasks of `parent_id`.
    fn subtasks_of(&self, parent_id: TaskId) -> EngineResult<Vec<TaskId>>;
}

impl EdgeSource for [(TaskId, TaskId)] {
    fn subtasks_of(&self, parent_id: TaskId) -> EngineResult<Vec<TaskId>> {
        Ok(self
            .iter()
            .filter(|(parent, _)| *parent == parent_id)
            .map(|(_, subtask)| *subtask)
            .collect())
    }
}

impl EdgeSource for [ParentLink] {
    fn subtasks_of(&self, parent_id: TaskId) -> EngineResult<Vec<TaskId>> {
        Ok(self
            .iter()
            .filter(|link| link.parent_id == parent_id)
            .map(|link| link.subtask_id)
            .collect())
    }
}

/// Fail if adding `parent_id -> subtask_id` would make a task its own ancestor.
///
/// Walks breadth-first from `subtask_id` down through every existing level of
/// subtasks; reaching `parent_id` means the parent is already a descendant.
pub fn assert_no_cycle<E>(edges: &E, parent_id: TaskId, subtask_id: TaskId) -> EngineResult<()>
where
    E: EdgeSource + ?Sized,
{
    if parent_id == subtask_id {
        return Err(EngineError::self_reference(parent_id));
    }

    let mut visited: HashSet<TaskId> = HashSet::new();
    let mut queue: VecDeque<TaskId> = VecDeque::new();
    queue.push_back(subtask_id);

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }

        for next in edges.subtasks_of(current)? {
            if next == parent_id {
                return Err(EngineError::cycle_detected(parent_id, subtask_id));
            }
            if !visited.contains(&next) {
                queue.push_back(next);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn unrelated_tasks_may_link() {
        let edges: [(TaskId, TaskId); 1] = [(1, 2)];
        assert!(assert_no_cycle(&edges[..], 3, 4).is_ok());
        assert!(assert_no_cycle(&edges[..], 2, 3).is_ok());
    }

    #[test]
    fn direct_back_edge_rejected() {
        let edges: [(TaskId, TaskId); 1] = [(1, 2)];
        let err = assert_no_cycle(&edges[..], 2, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::CycleDetected);
    }

    #[test]
    fn deep_chain_back_edge_rejected() {
        // A -> B -> C -> D, then D -> A
        let edges: [(TaskId, TaskId); 3] = [(1, 2), (2, 3), (3, 4)];
        let err = assert_no_cycle(&edges[..], 4, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::CycleDetected);

        let err = assert_no_cycle(&edges[..], 3, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::CycleDetected);
    }

    #[test]
    fn sibling_branches_do_not_count_as_cycles() {
        // 1 -> 2, 1 -> 3, 3 -> 4; linking 2 -> 4's sibling is fine
        let edges: [(TaskId, TaskId); 3] = [(1, 2), (1, 3), (3, 4)];
        assert!(assert_no_cycle(&edges[..], 2, 5).is_ok());
        assert!(assert_no_cycle(&edges[..], 4, 2).is_ok());
    }

    #[test]
    fn self_link_is_self_reference() {
        let edges: [(TaskId, TaskId); 0] = [];
        let err = assert_no_cycle(&edges[..], 7, 7).unwrap_err();
        assert_eq!(err.code, ErrorCode::SelfReference);
    }

    #[test]
    fn parent_link_rows_are_an_edge_source() {
        let links = vec![
            ParentLink { parent_id: 1, subtask_id: 2, created_at: 0 },
            ParentLink { parent_id: 2, subtask_id: 3, created_at: 0 },
        ];
        let err = assert_no_cycle(links.as_slice(), 3, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::CycleDetected);
    }
}
