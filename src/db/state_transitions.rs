//! Status history: an append-only record of every status a task enters.

use super::{Database, now_ms};
use crate::error::EngineResult;
use crate::types::{StatusHistoryEntry, TaskId, TaskStatus};
use rusqlite::types::Type;
use rusqlite::{Connection, params};

/// Record a task entering `status`, closing the previously open entry.
///
/// Must run on the same transaction as the status write it describes.
pub(crate) fn record_status_transition(
    conn: &Connection,
    task_id: TaskId,
    status: TaskStatus,
) -> EngineResult<()> {
    let now = now_ms();

    conn.execute(
        "UPDATE task_status_history SET end_timestamp = ?1
         WHERE task_id = ?2 AND end_timestamp IS NULL",
        params![now, task_id],
    )?;

    conn.execute(
        "INSERT INTO task_status_history (task_id, status, timestamp) VALUES (?1, ?2, ?3)",
        params![task_id, status.as_str(), now],
    )?;

    Ok(())
}

impl Database {
    /// Status history for a task, oldest first. Empty for unknown tasks.
    pub fn get_status_history(&self, task_id: TaskId) -> EngineResult<Vec<StatusHistoryEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, task_id, status, timestamp, end_timestamp
                 FROM task_status_history
                 WHERE task_id = ?1
                 ORDER BY id ASC",
            )?;

            let entries = stmt
                .query_map(params![task_id], |row| {
                    let status: String = row.get(2)?;
                    let status = status.parse::<TaskStatus>().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
                    })?;
                    Ok(StatusHistoryEntry {
                        id: row.get(0)?,
                        task_id: row.get(1)?,
                        status,
                        timestamp: row.get(3)?,
                        end_timestamp: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(entries)
        })
    }
}
