//! Durable catalog for Kalycs.
//!
//! This crate is the single source of truth for persisted state: projects,
//! classification rules, and the files the classifier has recorded. One
//! [`Catalog`] handle owns the SQLite pool; repository operations are grouped
//! in per-domain modules (`projects`, `rules`, `files`).
//!
//! # Usage
//!
//! ```rust,ignore
//! use kalycs_catalog::{Catalog, Project, Result};
//!
//! let catalog = Catalog::open("~/.kalycs/Kalycs/kalycs.db").await?;
//!
//! let mut project = Project::new("Invoices");
//! catalog.create_project(&mut project).await?;
//!
//! let rules = catalog.list_active_rules().await?;
//! ```

mod error;
mod files;
mod projects;
mod rules;
mod schema;
mod transaction;

pub mod ids;
pub mod types;
pub mod validation;

pub use error::{classify_driver_error, CatalogError, ConstraintKind, Result};
pub use transaction::{Isolation, TransactionOptions};
pub use types::*;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use tracing::info;

/// Shared handle to the Kalycs catalog.
///
/// Cloning is cheap; all clones share one connection pool. This is the only
/// way to touch the database; no raw sqlx elsewhere.
#[derive(Clone, Debug)]
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    /// Open or create the catalog at the given path.
    ///
    /// The schema is created idempotently; foreign keys and write-ahead
    /// journaling are enabled on every pooled connection.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let catalog = Self { pool };
        catalog.ensure_schema().await?;

        info!(path = %path.display(), "Catalog opened");

        Ok(catalog)
    }

    /// In-memory catalog for tests. A single pooled connection keeps the
    /// database alive for the lifetime of the handle.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let catalog = Self { pool };
        catalog.ensure_schema().await?;

        Ok(catalog)
    }

    /// Get the underlying connection pool (escape hatch for tests).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the catalog. Safe to call more than once; later calls are no-ops.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// Timestamp utilities
impl Catalog {
    /// Current UTC time as milliseconds since the Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Convert stored epoch milliseconds back to a UTC timestamp.
    pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_else(chrono::Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn open_creates_database_file() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("kalycs.db");

        let catalog = Catalog::open(&db_path).await.unwrap();
        assert!(db_path.exists());

        catalog.close().await;
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let catalog = Catalog::open_in_memory().await.unwrap();
        catalog.close().await;
        catalog.close().await;
        assert!(catalog.pool().is_closed());
    }

    #[tokio::test]
    async fn schema_creation_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("kalycs.db");

        let first = Catalog::open(&db_path).await.unwrap();
        first.close().await;
        let second = Catalog::open(&db_path).await.unwrap();
        second.close().await;
    }
}
