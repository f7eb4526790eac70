//! Rule repository operations.

use crate::error::{classify_driver_error, CatalogError, ConstraintKind, Result};
use crate::ids;
use crate::types::{Rule, RuleKind};
use crate::validation;
use crate::Catalog;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, warn};

const RULE_COLUMNS: &str =
    "id, name, project_id, kind, texts, case_sensitive, priority, created_at, updated_at";

impl Catalog {
    /// Get a rule by id; absence yields `None`.
    pub async fn get_rule_by_id(&self, id: &str) -> Result<Option<Rule>> {
        let row = sqlx::query(&format!("SELECT {RULE_COLUMNS} FROM rules WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row_to_rule(&row)).transpose()
    }

    /// List the rules owned by one project.
    pub async fn list_rules_by_project(&self, project_id: &str) -> Result<Vec<Rule>> {
        let rows = sqlx::query(&format!(
            "SELECT {RULE_COLUMNS} FROM rules WHERE project_id = ?"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_rule).collect()
    }

    /// List every rule whose owning project is active, lowest priority first.
    pub async fn list_active_rules(&self) -> Result<Vec<Rule>> {
        let rows = sqlx::query(
            r#"SELECT r.id, r.name, r.project_id, r.kind, r.texts, r.case_sensitive,
                      r.priority, r.created_at, r.updated_at
               FROM rules r
               INNER JOIN projects p ON r.project_id = p.id
               WHERE p.is_active = 1
               ORDER BY r.priority ASC, r.created_at ASC"#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_rule).collect()
    }

    /// Validate (normalizing `texts`), assign an id, and insert.
    pub async fn create_rule(&self, rule: &mut Rule) -> Result<()> {
        normalize_rule(rule);
        if let Err(err) = validation::validate_rule(rule) {
            warn!(rule_name = %rule.name, error = %err, "Rule validation failed");
            return Err(err.into());
        }

        rule.id = ids::generate_id();
        let now = Self::now_millis();
        rule.created_at = Self::millis_to_datetime(now);
        rule.updated_at = rule.created_at;

        let result = sqlx::query(
            r#"INSERT INTO rules (id, name, project_id, kind, texts, case_sensitive, priority, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&rule.id)
        .bind(&rule.name)
        .bind(&rule.project_id)
        .bind(rule.kind.as_str())
        .bind(&rule.texts)
        .bind(rule.case_sensitive)
        .bind(rule.priority)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(rule_id = %rule.id, rule_name = %rule.name, project_id = %rule.project_id, "Rule created");
                Ok(())
            }
            Err(err) if classify_driver_error(&err) == ConstraintKind::ForeignKey => {
                warn!(rule_name = %rule.name, project_id = %rule.project_id, "Rule creation failed - project does not exist");
                Err(CatalogError::constraint(format!(
                    "rule references missing project '{}'",
                    rule.project_id
                )))
            }
            Err(err) => {
                warn!(rule_name = %rule.name, error = %err, "Failed to create rule");
                Err(err.into())
            }
        }
    }

    /// Validate (normalizing `texts`) and update the matching row.
    pub async fn update_rule(&self, rule: &mut Rule) -> Result<()> {
        normalize_rule(rule);
        if let Err(err) = validation::validate_rule(rule) {
            warn!(rule_id = %rule.id, rule_name = %rule.name, error = %err, "Rule validation failed during update");
            return Err(err.into());
        }

        let now = Self::now_millis();
        rule.updated_at = Self::millis_to_datetime(now);

        let result = sqlx::query(
            r#"UPDATE rules
               SET name = ?, project_id = ?, kind = ?, texts = ?, case_sensitive = ?, priority = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&rule.name)
        .bind(&rule.project_id)
        .bind(rule.kind.as_str())
        .bind(&rule.texts)
        .bind(rule.case_sensitive)
        .bind(rule.priority)
        .bind(now)
        .bind(&rule.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(rule_id = %rule.id, "Rule update failed - rule not found");
            return Err(CatalogError::not_found(format!(
                "rule with ID '{}' not found",
                rule.id
            )));
        }

        info!(rule_id = %rule.id, rule_name = %rule.name, project_id = %rule.project_id, "Rule updated");
        Ok(())
    }

    /// Delete a rule.
    pub async fn delete_rule(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM rules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            warn!(rule_id = %id, "Rule deletion failed - rule not found");
            return Err(CatalogError::not_found(format!(
                "rule with ID '{id}' not found"
            )));
        }

        info!(rule_id = %id, "Rule deleted");
        Ok(())
    }
}

fn normalize_rule(rule: &mut Rule) {
    rule.name = rule.name.trim().to_string();
    rule.texts = rule.texts.trim().to_string();
}

fn row_to_rule(row: &SqliteRow) -> Result<Rule> {
    let kind_str: String = row.get("kind");
    let kind = RuleKind::parse(&kind_str)
        .ok_or_else(|| CatalogError::invalid_state(format!("unknown rule kind: {kind_str}")))?;

    Ok(Rule {
        id: row.get("id"),
        name: row.get("name"),
        project_id: row.get("project_id"),
        kind,
        texts: row.get("texts"),
        case_sensitive: row.get("case_sensitive"),
        priority: row.get("priority"),
        created_at: Catalog::millis_to_datetime(row.get("created_at")),
        updated_at: Catalog::millis_to_datetime(row.get("updated_at")),
    })
}
