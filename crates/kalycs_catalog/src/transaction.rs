//! Transaction helper wrapping a closure in begin/commit/rollback.

use crate::error::{CatalogError, Result};
use crate::Catalog;
use futures::future::BoxFuture;
use sqlx::{Sqlite, Transaction};

/// Isolation hint for [`Catalog::with_transaction`].
///
/// SQLite executes every transaction at serializable isolation; requesting
/// anything else is rejected, matching the underlying driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Isolation {
    #[default]
    Serializable,
}

/// Optional hints applied when opening a transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionOptions {
    pub isolation: Option<Isolation>,
    /// Discard all changes at the end instead of committing.
    pub read_only: bool,
}

impl Catalog {
    /// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// If `f` panics the transaction guard is dropped, which rolls back
    /// before the unwind continues. With `read_only` the transaction always
    /// ends in a rollback, so accidental writes never become visible.
    pub async fn with_transaction<T, F>(&self, options: TransactionOptions, f: F) -> Result<T>
    where
        F: for<'t> FnOnce(&'t mut Transaction<'static, Sqlite>) -> BoxFuture<'t, Result<T>>,
    {
        match options.isolation {
            None | Some(Isolation::Serializable) => {}
        }

        let mut tx = self.pool.begin().await?;

        match f(&mut tx).await {
            Ok(value) => {
                if options.read_only {
                    tx.rollback().await?;
                } else {
                    tx.commit().await.map_err(|err| {
                        CatalogError::invalid_state(format!("failed to commit transaction: {err}"))
                    })?;
                }
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    return Err(CatalogError::invalid_state(format!(
                        "transaction failed: {err}, rollback failed: {rollback_err}"
                    )));
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn commits_on_success() {
        let catalog = Catalog::open_in_memory().await.unwrap();

        catalog
            .with_transaction(TransactionOptions::default(), |tx| {
                Box::pin(async move {
                    sqlx::query(
                        "INSERT INTO projects (id, name, is_active, created_at, updated_at)
                         VALUES ('550e8400-e29b-41d4-a716-446655440000', 'tx test', 1, 1, 1)",
                    )
                    .execute(&mut **tx)
                    .await?;
                    Ok(())
                })
            })
            .await
            .unwrap();

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM projects")
            .fetch_one(catalog.pool())
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn rolls_back_on_error() {
        let catalog = Catalog::open_in_memory().await.unwrap();

        let result: Result<()> = catalog
            .with_transaction(TransactionOptions::default(), |tx| {
                Box::pin(async move {
                    sqlx::query(
                        "INSERT INTO projects (id, name, is_active, created_at, updated_at)
                         VALUES ('550e8400-e29b-41d4-a716-446655440000', 'doomed', 1, 1, 1)",
                    )
                    .execute(&mut **tx)
                    .await?;
                    Err(CatalogError::invalid_state("boom"))
                })
            })
            .await;
        assert!(result.is_err());

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM projects")
            .fetch_one(catalog.pool())
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn read_only_transactions_never_commit() {
        let catalog = Catalog::open_in_memory().await.unwrap();

        let options = TransactionOptions {
            read_only: true,
            ..Default::default()
        };
        catalog
            .with_transaction(options, |tx| {
                Box::pin(async move {
                    sqlx::query(
                        "INSERT INTO projects (id, name, is_active, created_at, updated_at)
                         VALUES ('550e8400-e29b-41d4-a716-446655440000', 'phantom', 1, 1, 1)",
                    )
                    .execute(&mut **tx)
                    .await?;
                    Ok(())
                })
            })
            .await
            .unwrap();

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM projects")
            .fetch_one(catalog.pool())
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 0);
    }
}
