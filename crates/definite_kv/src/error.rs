//! Error types for the store client.

use definite_kv_protocol::{ValidationError, Version};
use thiserror::Error;

/// Result type for store operations.
pub type KvResult<T> = Result<T, KvError>;

/// Errors that can occur while talking to a store.
///
/// Every variant leaves the local snapshot and pending changes exactly as
/// they were before the failing call.
#[derive(Error, Debug)]
pub enum KvError {
    /// The server's version no longer matches the one the client committed against.
    #[error(
        "commit conflict on store {store}: committed against {}, server is at {}",
        fmt_version(.expected),
        fmt_version(.current)
    )]
    Conflict {
        /// Store name.
        store: String,
        /// Version the client believed was current.
        expected: Option<Version>,
        /// Version the server reported, if any.
        current: Option<Version>,
    },

    /// Network failure before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// Server answered with a non-2xx status unrelated to versioning.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Credential rejected.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// Store resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed store name or key.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Response body could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Client configuration could not be resolved.
    #[error("configuration error: {0}")]
    Config(String),
}

fn fmt_version(version: &Option<Version>) -> String {
    match version {
        Some(v) => format!("version {}", v),
        None => "no version".to_string(),
    }
}

impl KvError {
    /// Returns true if this is a version conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, KvError::Conflict { .. })
    }

    /// Returns true if repeating the identical call may succeed.
    ///
    /// Conflicts are never retryable: the caller has to reload first.
    pub fn is_retryable(&self) -> bool {
        match self {
            KvError::Transport(_) => true,
            KvError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
