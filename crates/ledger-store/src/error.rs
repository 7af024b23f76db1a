use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with the ledger store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row touched by a unit of work was not at the expected version,
    /// or an insert collided with an existing key.
    #[error(
        "Concurrency conflict on {resource}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        resource: String,
        expected: Version,
        actual: Version,
    },

    /// The unit of work was rejected before touching any row.
    #[error("Invalid unit of work: {0}")]
    InvalidUnitOfWork(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true if retrying from a fresh read may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for ledger store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
