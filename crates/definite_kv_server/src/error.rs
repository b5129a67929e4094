//! Error types for the store server.

use definite_kv_protocol::{ValidationError, Version};
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the store server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Malformed store name or key.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Missing or unknown credential.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Commit against a version that is no longer current.
    #[error("version conflict: expected {current:?}, got {actual:?}")]
    VersionConflict {
        /// Server's current version.
        current: Option<u64>,
        /// Version the client sent.
        actual: Option<Version>,
    },

    /// Store does not exist.
    #[error("store not found: {0}")]
    StoreNotFound(String),

    /// No endpoint at this method and path.
    #[error("no route for {0}")]
    NoRoute(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) | ServerError::Validation(_) => 400,
            ServerError::NotAuthorized(_) => 401,
            ServerError::StoreNotFound(_) | ServerError::NoRoute(_) => 404,
            ServerError::VersionConflict { .. } => 409,
            ServerError::Internal(_) => 500,
        }
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}
