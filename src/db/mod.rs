//! Database layer for the task hierarchy engine.
//!
//! Every public mutating operation runs inside exactly one `IMMEDIATE`
//! transaction obtained through [`Database::with_transaction`]; returning an
//! error from the closure drops the transaction, which rolls it back.

pub mod cycle;
pub mod links;
pub mod listing;
pub mod state_transitions;
pub mod status;
pub mod tasks;

use crate::config::DatabaseConfig;
use crate::error::{EngineError, EngineResult};
use anyhow::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path with default settings.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &DatabaseConfig::default())
    }

    /// Open or create the database at the given path.
    pub fn open_with<P: AsRef<Path>>(path: P, config: &DatabaseConfig) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL for concurrent readers; busy_timeout so racing writers wait
        // for the lock instead of failing immediately.
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout={};",
            config.busy_timeout_ms
        ))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;
        debug!(path = %path.display(), "database opened");

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.lock()?;
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| EngineError::internal("database connection lock poisoned"))
    }

    /// Execute a read-only function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&Connection) -> EngineResult<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Execute a function inside one write transaction, committing on `Ok`.
    pub fn with_transaction<F, T>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> EngineResult<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `?, ?, ?` for an `IN (...)` clause with `n` parameters.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
