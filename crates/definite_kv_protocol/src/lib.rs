//! # Definite KV Protocol
//!
//! Wire types for the Definite key-value store API.
//!
//! This crate provides:
//! - `Version`, the opaque version token used for optimistic concurrency
//! - Snapshot and commit messages (JSON via serde)
//! - `HttpRequest` / `HttpResponse`, the envelope shared by client and server
//! - The route table for store endpoints
//! - Store name and key validation
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod envelope;
mod messages;
mod validate;
mod version;

pub use envelope::{
    commit_path, store_path, HttpRequest, HttpResponse, Method, Route, STORE_PREFIX,
};
pub use messages::{
    CommitRequest, CommitResponse, ErrorBody, SnapshotResponse, STORE_NOT_FOUND,
};
pub use validate::{
    validate_key, validate_store_name, ValidationError, MAX_KEY_BYTES, MAX_STORE_NAME_LEN,
};
pub use version::Version;
