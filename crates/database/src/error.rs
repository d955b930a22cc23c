//! Database error types.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// A mark/requeue was attempted on a Delivered or Failed notification.
    #[error("notification {id} is in a terminal state")]
    Terminal { id: String },

    /// A delivery outcome was recorded for a notification nobody claimed.
    #[error("notification {id} is {status}, not in flight")]
    NotInFlight { id: String, status: String },

    /// A stored row could not be decoded back into its domain type.
    #[error("corrupt row in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
