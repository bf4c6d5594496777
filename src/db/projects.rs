//! Project persistence.
//!
//! `words` and `config` are stored as serialized JSON text. SQL NULL means
//! the field is absent; anything else must parse, since only this module
//! writes those columns.

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value as JsonValue;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Project;

use super::DbPool;

const PROJECT_COLUMNS: &str = "id, title, created_at, video_path, words, config";

/// Raw `projects` row before JSON decoding.
struct ProjectRow {
    id: String,
    title: String,
    created_at: String,
    video_path: Option<String>,
    words: Option<String>,
    config: Option<String>,
}

impl ProjectRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ProjectRow {
            id: row.get(0)?,
            title: row.get(1)?,
            created_at: row.get(2)?,
            video_path: row.get(3)?,
            words: row.get(4)?,
            config: row.get(5)?,
        })
    }

    fn into_project(self) -> AppResult<Project> {
        let words = decode_json(&self.id, "words", self.words.as_deref())?;
        let config = decode_json(&self.id, "config", self.config.as_deref())?;
        Ok(Project {
            id: self.id,
            title: self.title,
            created_at: self.created_at,
            video_path: self.video_path,
            words,
            config,
        })
    }
}

/// CRUD access to the `projects` table.
#[derive(Clone)]
pub struct ProjectStore {
    pool: DbPool,
}

impl ProjectStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// All projects, newest first.
    pub fn list(&self) -> AppResult<Vec<Project>> {
        self.pool.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([], ProjectRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(ProjectRow::into_project).collect()
        })
    }

    pub fn get(&self, id: &str) -> AppResult<Option<Project>> {
        self.pool.with_connection(|conn| select_project(conn, id))
    }

    /// Insert a new project and return it as stored.
    pub fn create(
        &self,
        title: &str,
        video_path: Option<&str>,
        words: Option<&JsonValue>,
        config: Option<&JsonValue>,
    ) -> AppResult<Project> {
        let id = Uuid::new_v4().to_string();
        let words_text = encode_json(words)?;
        let config_text = encode_json(config)?;

        // Stamped under the connection lock so timestamps follow commit order
        let created_at = self.pool.with_connection(|conn| {
            let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            conn.execute(
                "INSERT INTO projects (id, title, created_at, video_path, words, config)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, title, created_at, video_path, words_text, config_text],
            )
            .map_err(|e| AppError::Database(format!("Failed to insert project: {}", e)))?;
            Ok(created_at)
        })?;

        info!("Created project {}", id);

        Ok(Project {
            id,
            title: title.to_string(),
            created_at,
            video_path: video_path.map(str::to_string),
            words: words.filter(|v| !v.is_null()).cloned(),
            config: config.filter(|v| !v.is_null()).cloned(),
        })
    }

    /// Overwrite `words` and `config`.
    ///
    /// NOTE: a `None` argument clears the column rather than leaving it
    /// untouched. Callers relying on partial updates must resend both fields.
    pub fn update(
        &self,
        id: &str,
        words: Option<&JsonValue>,
        config: Option<&JsonValue>,
    ) -> AppResult<Option<Project>> {
        let words_text = encode_json(words)?;
        let config_text = encode_json(config)?;

        self.pool.with_connection(|conn| {
            let changed = conn
                .execute(
                    "UPDATE projects SET words = ?1, config = ?2 WHERE id = ?3",
                    params![words_text, config_text, id],
                )
                .map_err(|e| AppError::Database(format!("Failed to update project: {}", e)))?;
            if changed == 0 {
                return Ok(None);
            }
            select_project(conn, id)
        })
    }

    /// Cheap round trip used by the readiness probe.
    pub fn ping(&self) -> AppResult<()> {
        self.pool
            .with_connection(|conn| Ok(conn.query_row("SELECT 1", [], |_| Ok(()))?))
    }
}

fn select_project(conn: &Connection, id: &str) -> AppResult<Option<Project>> {
    let row = conn
        .query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            params![id],
            ProjectRow::from_row,
        )
        .optional()?;
    row.map(ProjectRow::into_project).transpose()
}

/// Absent values and JSON `null` are both stored as SQL NULL.
fn encode_json(value: Option<&JsonValue>) -> AppResult<Option<String>> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => serde_json::to_string(value)
            .map(Some)
            .map_err(|e| AppError::Database(format!("Failed to serialize JSON column: {}", e))),
    }
}

fn decode_json(id: &str, column: &str, text: Option<&str>) -> AppResult<Option<JsonValue>> {
    match text {
        None => Ok(None),
        Some(text) => serde_json::from_str(text).map(Some).map_err(|e| {
            AppError::Corruption(format!("project {} column {}: {}", id, column, e))
        }),
    }
}
