//! Error types for the catalog layer.

use crate::validation::ValidationErrors;
use thiserror::Error;

/// Catalog operation result type.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors surfaced by catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// SQLx error (connection, query, etc.)
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// IO error (file system operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Field-level input violations
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Row required by the operation does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique-name collision
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Malformed UUID input
    #[error("Invalid id: {0}")]
    InvalidId(String),

    /// Constraint violation (foreign key, not null, check)
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Invalid state transition
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CatalogError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an already-exists error.
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Create an invalid-id error.
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Create a constraint error.
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    /// Create an invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

/// Classification of an underlying driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
    Connection,
    Transaction,
    Unknown,
}

/// Classify a driver error by substring-matching its message.
///
/// SQLite reports constraint failures as plain text ("UNIQUE constraint
/// failed: projects.name"); callers use the result to translate into the
/// public error taxonomy. Foreign-key and not-null checks run before the
/// generic unique check because their messages also contain "constraint".
pub fn classify_driver_error(err: &sqlx::Error) -> ConstraintKind {
    if matches!(
        err,
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)
    ) {
        return ConstraintKind::Connection;
    }

    let msg = err.to_string().to_lowercase();
    if msg.contains("foreign key") || msg.contains("references") {
        ConstraintKind::ForeignKey
    } else if msg.contains("not null") || msg.contains("null constraint") {
        ConstraintKind::NotNull
    } else if msg.contains("check constraint") {
        ConstraintKind::Check
    } else if msg.contains("unique") || msg.contains("duplicate") {
        ConstraintKind::Unique
    } else if msg.contains("transaction") {
        ConstraintKind::Transaction
    } else {
        ConstraintKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver_error(msg: &str) -> sqlx::Error {
        sqlx::Error::Protocol(msg.to_string())
    }

    #[test]
    fn classifies_unique_violations() {
        let err = driver_error("UNIQUE constraint failed: projects.name");
        assert_eq!(classify_driver_error(&err), ConstraintKind::Unique);
    }

    #[test]
    fn classifies_foreign_key_violations() {
        let err = driver_error("FOREIGN KEY constraint failed");
        assert_eq!(classify_driver_error(&err), ConstraintKind::ForeignKey);
    }

    #[test]
    fn classifies_not_null_violations() {
        let err = driver_error("NOT NULL constraint failed: rules.name");
        assert_eq!(classify_driver_error(&err), ConstraintKind::NotNull);
    }

    #[test]
    fn classifies_check_violations() {
        let err = driver_error("CHECK constraint failed: length(name) <= 25");
        assert_eq!(classify_driver_error(&err), ConstraintKind::Check);
    }

    #[test]
    fn unrecognized_messages_are_unknown() {
        let err = driver_error("database disk image is malformed");
        assert_eq!(classify_driver_error(&err), ConstraintKind::Unknown);
    }
}
