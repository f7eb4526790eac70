//! Stable identifier helpers.
//!
//! Every catalog row is keyed by a version-4 UUID string. The repositories
//! only check the shape (36 characters, exactly 4 hyphens) before touching
//! the database, matching what the schema stores.

use uuid::Uuid;

/// Length of a hyphenated UUID string.
pub const ID_LENGTH: usize = 36;

/// Hyphen count of a hyphenated UUID string.
pub const ID_HYPHEN_COUNT: usize = 4;

/// Generate a new version-4 UUID string.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Shape check used at the repository and validation boundaries.
pub fn is_valid_id(id: &str) -> bool {
    if id.trim().is_empty() {
        return false;
    }
    id.len() == ID_LENGTH && id.chars().filter(|&c| c == '-').count() == ID_HYPHEN_COUNT
}
