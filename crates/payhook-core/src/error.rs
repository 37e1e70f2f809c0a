//! Error types and result handling for storage operations.
//!
//! Translates database failures into a small taxonomy so callers can tell a
//! uniqueness violation (an expected outcome for redelivered webhooks) apart
//! from genuine infrastructure faults.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for storage operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// A unique constraint rejected the write.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
}

impl CoreError {
    /// Returns true when the error is a unique constraint violation.
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey(_))
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::DuplicateKey(db_err.constraint().unwrap_or("unique").to_string())
            },
            _ => Self::Database(err.to_string()),
        }
    }
}
