//! Database module providing connection management, migrations, and queries.

pub mod migrations;
pub mod projects;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

pub use migrations::{AppliedMigration, MigrationRunner};
pub use projects::ProjectStore;

/// Database connection pool wrapper.
/// Uses a Mutex since rusqlite Connection is not thread-safe.
///
/// The connection is owned by whoever created the pool and released by
/// [`DbPool::close`]; clones share the same handle.
#[derive(Clone)]
pub struct DbPool {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl DbPool {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> AppResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Database(format!("Failed to create database directory: {}", e))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        // WAL keeps readers unblocked by an in-flight write (pragma returns the mode, so use query_row)
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
            .map_err(|e| AppError::Database(format!("Failed to set journal_mode pragma: {}", e)))?;

        info!("Opened database at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        DbPool {
            conn: Arc::new(Mutex::new(Some(conn))),
        }
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&mut Connection) -> AppResult<T>) -> AppResult<T> {
        let mut guard = self.lock()?;
        let conn = guard
            .as_mut()
            .ok_or_else(|| AppError::Database("Database connection is closed".to_string()))?;
        f(conn)
    }

    /// Close the connection. Later calls through any clone fail.
    ///
    /// Called once by the process owner after the HTTP server has stopped.
    pub fn close(&self) -> AppResult<()> {
        let taken = self.lock()?.take();
        match taken {
            Some(conn) => {
                conn.close().map_err(|(_, e)| {
                    AppError::Database(format!("Failed to close database: {}", e))
                })?;
                info!("Database connection closed");
            }
            None => warn!("Database connection already closed"),
        }
        Ok(())
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Option<Connection>>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Database("Database mutex poisoned".to_string()))
    }
}
