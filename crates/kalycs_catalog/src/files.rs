//! File repository operations.

use crate::error::{CatalogError, Result};
use crate::ids;
use crate::types::FileRecord;
use crate::Catalog;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, warn};

const FILE_COLUMNS: &str =
    "id, path, name, ext, size, mtime, project_id, created_at, updated_at";

impl Catalog {
    /// Look up a file by its absolute path; absence yields `None`.
    pub async fn get_file_by_path(&self, path: &str) -> Result<Option<FileRecord>> {
        let row = sqlx::query(&format!("SELECT {FILE_COLUMNS} FROM files WHERE path = ?"))
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row_to_file(&row)))
    }

    /// Atomic insert-or-update keyed on the unique path.
    ///
    /// A fresh row gets the record's id (generated when absent); an existing
    /// row keeps its id and `created_at` while the mutable fields are
    /// overwritten.
    pub async fn upsert_file(&self, file: &mut FileRecord) -> Result<()> {
        if file.id.is_empty() {
            file.id = ids::generate_id();
        }
        let now = Self::now_millis();
        file.created_at = Self::millis_to_datetime(now);
        file.updated_at = file.created_at;

        let result = sqlx::query(
            r#"INSERT INTO files (id, path, name, ext, size, mtime, project_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(path) DO UPDATE SET
                   name = excluded.name,
                   ext = excluded.ext,
                   size = excluded.size,
                   mtime = excluded.mtime,
                   project_id = excluded.project_id,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&file.id)
        .bind(&file.path)
        .bind(&file.name)
        .bind(&file.ext)
        .bind(file.size)
        .bind(file.mtime.timestamp_millis())
        .bind(&file.project_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            warn!(file_path = %file.path, file_name = %file.name, error = %err, "Failed to upsert file");
            return Err(err.into());
        }

        info!(
            file_path = %file.path,
            file_name = %file.name,
            project_id = file.project_id.as_deref().unwrap_or("unassigned"),
            size_bytes = file.size,
            "File upserted"
        );
        Ok(())
    }

    /// Update the owning project of a recorded file; `None` clears it.
    pub async fn set_file_project(&self, file_id: &str, project_id: Option<&str>) -> Result<()> {
        let result = sqlx::query("UPDATE files SET project_id = ? WHERE id = ?")
            .bind(project_id)
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            warn!(file_id = %file_id, "File project update failed - file not found");
            return Err(CatalogError::not_found(format!(
                "file with ID '{file_id}' not found"
            )));
        }

        info!(file_id = %file_id, project_id = project_id.unwrap_or("none"), "File project updated");
        Ok(())
    }

    /// List the files owned by one project.
    pub async fn list_files_by_project(&self, project_id: &str) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE project_id = ?"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_file).collect())
    }
}

fn row_to_file(row: &SqliteRow) -> FileRecord {
    FileRecord {
        id: row.get("id"),
        path: row.get("path"),
        name: row.get("name"),
        ext: row.get("ext"),
        size: row.get("size"),
        mtime: Catalog::millis_to_datetime(row.get("mtime")),
        project_id: row.get("project_id"),
        created_at: Catalog::millis_to_datetime(row.get("created_at")),
        updated_at: Catalog::millis_to_datetime(row.get("updated_at")),
    }
}
