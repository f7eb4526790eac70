//! Project repository operations.

use crate::error::{classify_driver_error, CatalogError, ConstraintKind, Result};
use crate::ids;
use crate::types::Project;
use crate::validation;
use crate::Catalog;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, warn};

const PROJECT_COLUMNS: &str =
    "id, name, description, is_active, is_favourite, created_at, updated_at";

impl Catalog {
    /// Get a project by id. Fails with `InvalidId` on malformed input and
    /// `NotFound` when no row matches.
    pub async fn get_project_by_id(&self, id: &str) -> Result<Project> {
        if !ids::is_valid_id(id) {
            return Err(CatalogError::invalid_id(format!(
                "invalid project ID format: '{id}'"
            )));
        }

        let row = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_project(&row),
            None => Err(CatalogError::not_found(format!(
                "project with ID '{id}' not found"
            ))),
        }
    }

    /// Get a project by its exact name. Absence is not an error; the
    /// classifier relies on `None` to detect first boot.
    pub async fn get_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let row = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE name = ?"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row_to_project(&row)).transpose()
    }

    /// List all projects, newest first.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_project).collect()
    }

    /// Validate, trim, assign an id if absent, set timestamps, and insert.
    pub async fn create_project(&self, project: &mut Project) -> Result<()> {
        normalize_project(project);
        if let Err(err) = validation::validate_project(project) {
            warn!(project_name = %project.name, error = %err, "Project validation failed");
            return Err(err.into());
        }

        if project.id.is_empty() {
            project.id = ids::generate_id();
        }
        let now = Self::now_millis();
        project.created_at = Self::millis_to_datetime(now);
        project.updated_at = project.created_at;

        let result = sqlx::query(
            r#"INSERT INTO projects (id, name, description, is_active, is_favourite, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.is_active)
        .bind(project.is_favourite)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(project_id = %project.id, project_name = %project.name, "Project created");
                Ok(())
            }
            Err(err) if classify_driver_error(&err) == ConstraintKind::Unique => {
                warn!(project_name = %project.name, "Project creation failed - name already exists");
                Err(CatalogError::already_exists(format!(
                    "project with name '{}' already exists",
                    project.name
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Validate, trim, bump `updated_at`, and update the matching row.
    pub async fn update_project(&self, project: &mut Project) -> Result<()> {
        if project.id.is_empty() {
            return Err(CatalogError::invalid_id(
                "project ID cannot be empty for update",
            ));
        }

        normalize_project(project);
        if let Err(err) = validation::validate_project(project) {
            warn!(project_id = %project.id, error = %err, "Project validation failed during update");
            return Err(err.into());
        }

        let now = Self::now_millis();
        project.updated_at = Self::millis_to_datetime(now);

        let result = sqlx::query(
            r#"UPDATE projects
               SET name = ?, description = ?, is_active = ?, is_favourite = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.is_active)
        .bind(project.is_favourite)
        .bind(now)
        .bind(&project.id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => {
                warn!(project_id = %project.id, "Project update failed - project not found");
                Err(CatalogError::not_found(format!(
                    "project with ID '{}' not found",
                    project.id
                )))
            }
            Ok(_) => {
                info!(project_id = %project.id, project_name = %project.name, "Project updated");
                Ok(())
            }
            Err(err) if classify_driver_error(&err) == ConstraintKind::Unique => {
                warn!(project_id = %project.id, project_name = %project.name, "Project update failed - name already exists");
                Err(CatalogError::already_exists(format!(
                    "project with name '{}' already exists",
                    project.name
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Delete a project; referential integrity cascades to its rules.
    pub async fn delete_project(&self, id: &str) -> Result<()> {
        if !ids::is_valid_id(id) {
            warn!(project_id = %id, "Invalid project ID format for deletion");
            return Err(CatalogError::invalid_id(format!(
                "invalid project ID format: '{id}'"
            )));
        }

        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => {
                warn!(project_id = %id, "Project deletion failed - project not found");
                Err(CatalogError::not_found(format!(
                    "project with ID '{id}' not found"
                )))
            }
            Ok(_) => {
                info!(project_id = %id, "Project deleted");
                Ok(())
            }
            Err(err) if classify_driver_error(&err) == ConstraintKind::ForeignKey => {
                warn!(project_id = %id, "Project deletion failed - still referenced");
                Err(CatalogError::constraint(format!(
                    "cannot delete project '{id}': it is still referenced"
                )))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn normalize_project(project: &mut Project) {
    project.name = project.name.trim().to_string();
    project.description = project.description.trim().to_string();
}

fn row_to_project(row: &SqliteRow) -> Result<Project> {
    Ok(Project {
        id: row.get("id"),
        name: row.get("name"),
        description: row
            .get::<Option<String>, _>("description")
            .unwrap_or_default(),
        is_active: row.get("is_active"),
        is_favourite: row.get("is_favourite"),
        created_at: Catalog::millis_to_datetime(row.get("created_at")),
        updated_at: Catalog::millis_to_datetime(row.get("updated_at")),
    })
}
