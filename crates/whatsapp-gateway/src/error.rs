//! Error types for the Evolution API gateway.

use thiserror::Error;

/// Errors that can occur when interacting with the Evolution API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API rejected request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// The WhatsApp instance is not in the `open` state.
    #[error("instance not connected (state: {0})")]
    Disconnected(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
