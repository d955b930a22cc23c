//! Error types for the delivery engine.

use avisa_database::DatabaseError;
use notify_core::TransportError;
use templates::TemplateError;
use thiserror::Error;

/// Errors that can occur in the delivery engine.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// A phone number could not be normalized to canonical form.
    #[error("invalid phone number: {0:?}")]
    InvalidPhone(String),

    /// Template lookup or rendering failed.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Subscriber store error during a due-date scan.
    #[error("subscriber store error: {0}")]
    Store(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for delivery engine operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
