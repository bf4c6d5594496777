//! Database migration runner.
//!
//! Migrations are plain `.sql` files in a directory. Files run in
//! lexicographic order of their names, each inside its own transaction, and
//! are recorded by name in the `migrations` table so that a file is applied
//! at most once.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

use super::DbPool;

/// Extension of recognized migration files.
const MIGRATION_EXTENSION: &str = ".sql";

/// A `;` that ends a line (or the file), with trailing whitespace ignored.
static STATEMENT_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r";\s*(?:\r?\n|$)").expect("statement separator pattern is valid"));

const CREATE_BOOKKEEPING_TABLE: &str = "CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    run_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

/// A migration recorded as applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub name: String,
    pub run_at: String,
}

/// Applies the `.sql` files of one directory.
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    dir: PathBuf,
}

impl MigrationRunner {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run all pending migrations and return the names applied by this call.
    ///
    /// Each migration commits on its own: when one fails, the ones before it
    /// stay applied and the failing one leaves no trace.
    pub fn apply(&self, pool: &DbPool) -> AppResult<Vec<String>> {
        let files = self.migration_files()?;

        pool.with_connection(|conn| {
            ensure_bookkeeping_table(conn)?;

            let mut applied = Vec::new();
            for name in files {
                if is_applied(conn, &name)? {
                    debug!("Migration {} already applied", name);
                    continue;
                }

                let sql = std::fs::read_to_string(self.dir.join(&name)).map_err(|e| {
                    AppError::Migration(format!("Failed to read migration {}: {}", name, e))
                })?;

                apply_one(conn, &name, &sql)?;
                info!("Applied migration {}", name);
                applied.push(name);
            }

            if applied.is_empty() {
                info!("No pending migrations");
            }
            Ok(applied)
        })
    }

    /// List applied migrations in the order they ran.
    pub fn applied(pool: &DbPool) -> AppResult<Vec<AppliedMigration>> {
        pool.with_connection(|conn| {
            ensure_bookkeeping_table(conn)?;
            let mut stmt = conn.prepare("SELECT name, run_at FROM migrations ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(AppliedMigration {
                        name: row.get(0)?,
                        run_at: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Names of the migration files in execution order.
    fn migration_files(&self) -> AppResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            AppError::Migration(format!(
                "Failed to read migrations directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AppError::Migration(e.to_string()))?;
            let is_file = entry
                .file_type()
                .map(|t| t.is_file())
                .map_err(|e| AppError::Migration(e.to_string()))?;
            if !is_file {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string()
                && name.ends_with(MIGRATION_EXTENSION)
            {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}

/// Split a migration file into individual statements.
pub fn split_statements(sql: &str) -> Vec<&str> {
    STATEMENT_SEPARATOR
        .split(sql)
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .collect()
}

fn ensure_bookkeeping_table(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(CREATE_BOOKKEEPING_TABLE).map_err(|e| {
        AppError::Migration(format!("Failed to create migrations table: {}", e))
    })
}

fn is_applied(conn: &Connection, name: &str) -> AppResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM migrations WHERE name = ?1",
            params![name],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn apply_one(conn: &mut Connection, name: &str, sql: &str) -> AppResult<()> {
    let fail = |e: rusqlite::Error| AppError::Migration(format!("Migration {} failed: {}", name, e));

    // Dropping the transaction without commit rolls it back
    let tx = conn.transaction().map_err(fail)?;
    for statement in split_statements(sql) {
        tx.execute_batch(statement).map_err(fail)?;
    }
    tx.execute("INSERT INTO migrations (name) VALUES (?1)", params![name])
        .map_err(fail)?;
    tx.commit().map_err(fail)
}
