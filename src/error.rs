//! Structured error types for engine operations.
//!
//! Every error carries an [`ErrorCode`] and a message whose prefix is stable
//! per code, so calling layers can map errors to protocol status codes
//! without parsing free text.

use crate::types::TaskId;
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Lookup failures
    NotFound,

    // Validation errors
    InvalidArgument,
    InvalidState,

    // Structural errors
    Conflict,
    SelfReference,
    CycleDetected,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// True for errors caused by the request rather than the engine.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ErrorCode::DatabaseError | ErrorCode::InternalError)
    }
}

/// Structured error returned by every engine operation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl EngineError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn task_not_found(task_id: TaskId) -> Self {
        Self::new(ErrorCode::NotFound, format!("not found: task {}", task_id))
    }

    pub fn tasks_not_found(task_ids: &[TaskId]) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("not found: subtask(s) {}", join_ids(task_ids)),
        )
    }

    pub fn link_not_found(parent_id: TaskId, subtask_id: TaskId) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!(
                "not found: link not found for parent={}, subtask={}",
                parent_id, subtask_id
            ),
        )
    }

    pub fn invalid_value(field: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidArgument,
            format!("invalid {}: {}", field, reason),
        )
        .with_field(field)
    }

    pub fn invalid_status(label: &str) -> Self {
        Self::invalid_value("status", format!("unrecognized status '{}'", label))
    }

    pub fn inactive_parent(parent_id: TaskId) -> Self {
        Self::new(
            ErrorCode::InvalidState,
            format!(
                "inactive: parent task {} cannot accept subtasks",
                parent_id
            ),
        )
    }

    pub fn inactive_tasks(task_ids: &[TaskId]) -> Self {
        Self::new(
            ErrorCode::InvalidState,
            format!("inactive: task(s) {}", join_ids(task_ids)),
        )
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidState,
            format!("invalid state: {}", reason.into()),
        )
    }

    pub fn already_has_parent(task_ids: &[TaskId]) -> Self {
        Self::new(
            ErrorCode::Conflict,
            format!("already has a parent: task(s) {}", join_ids(task_ids)),
        )
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, format!("conflict: {}", reason.into()))
    }

    pub fn self_reference(task_id: TaskId) -> Self {
        Self::new(
            ErrorCode::SelfReference,
            format!("self reference: task {} cannot be its own parent", task_id),
        )
    }

    pub fn cycle_detected(parent_id: TaskId, subtask_id: TaskId) -> Self {
        Self::new(
            ErrorCode::CycleDetected,
            format!(
                "cycle detected: task {} is a descendant of task {}",
                parent_id, subtask_id
            ),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EngineError {}

// Unique and primary-key violations mean another writer won the race for an edge.
impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, ref msg) = err {
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            {
                let detail = msg.clone().unwrap_or_else(|| failure.to_string());
                return EngineError::conflict("parent link already exists")
                    .with_details(detail);
            }
        }
        EngineError::database(err)
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<EngineError>() {
            Ok(engine_err) => engine_err,
            Err(err) => EngineError::internal(err),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
