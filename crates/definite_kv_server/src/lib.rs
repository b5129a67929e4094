//! # Definite KV Server
//!
//! Reference in-memory server for the Definite key-value store API.
//!
//! This crate provides:
//! - Fetch, commit and delete endpoints for versioned stores
//! - Compare-and-swap commits: a batch is applied only against the
//!   current version, entirely or not at all
//! - Bearer-token authentication with per-tenant store namespaces
//! - An axum HTTP front (`router`, `serve`)
//!
//! # Protocol
//!
//! 1. `GET /v1/store/{name}` returns every key and the current version
//! 2. `POST /v1/store/{name}/commit` applies upserts and deletes if the
//!    request's version is current, returning the new version; otherwise 409
//! 3. `DELETE /v1/store/{name}` removes the store
//!
//! Versions come from one counter shared by every store and are never
//! reused, so a client holding a version of a dropped store can never
//! commit over its replacement.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod error;
mod handler;
mod registry;
mod router;
mod server;

pub use auth::{parse_bearer, BearerAuth};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler};
pub use registry::{StoreRecord, StoreRegistry};
pub use router::{router, serve};
pub use server::KvServer;
