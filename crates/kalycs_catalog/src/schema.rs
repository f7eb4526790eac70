//! Schema creation for the Kalycs catalog.
//!
//! All CREATE statements live here. Timestamps are stored as INTEGER
//! milliseconds since the Unix epoch; `updated_at` is advanced by a
//! per-table trigger on every update.

use crate::error::Result;
use crate::Catalog;
use tracing::info;

/// Epoch milliseconds with sub-second precision, evaluated inside SQLite.
const NOW_MILLIS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000.0 AS INTEGER)";

impl Catalog {
    /// Ensure all tables, indexes, and triggers exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE CHECK(length(name) <= 25),
                description TEXT CHECK(length(description) <= 200),
                is_active INTEGER NOT NULL DEFAULT 1,
                is_favourite INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS rules (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL CHECK(length(name) <= 25),
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                kind TEXT NOT NULL CHECK(kind IN ('starts_with', 'contains', 'ends_with', 'extension', 'regex')),
                texts TEXT NOT NULL,
                case_sensitive INTEGER NOT NULL DEFAULT 0,
                priority INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS files (
                id TEXT PRIMARY KEY,
                path TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                ext TEXT NOT NULL,
                size INTEGER NOT NULL,
                mtime INTEGER NOT NULL,
                project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_rules_project ON rules(project_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_project ON files(project_id)")
            .execute(&self.pool)
            .await?;

        for table in ["projects", "rules", "files"] {
            sqlx::query(&format!(
                r#"CREATE TRIGGER IF NOT EXISTS trg_{table}_updated_at
                AFTER UPDATE ON {table}
                BEGIN
                    UPDATE {table} SET updated_at = {NOW_MILLIS_SQL} WHERE id = NEW.id;
                END"#,
            ))
            .execute(&self.pool)
            .await?;
        }

        info!("Catalog schema verified");
        Ok(())
    }
}
