//! # Definite KV
//!
//! Optimistic-concurrency key-value store client for the Definite API.
//!
//! This crate provides:
//! - `KvStore`, a local snapshot of a remote store with pending changes
//! - Version-guarded batch commit with explicit conflict reporting
//! - `StoreTransport` abstraction with HTTP, loopback and mock implementations
//! - Credential resolution via `ClientConfig`
//!
//! ## Architecture
//!
//! Opening a store fetches its full contents and a version token. Reads and
//! writes run against memory. `commit` sends the pending writes and deletes
//! with that token; the server applies the batch only if the token is still
//! current, otherwise the whole batch is rejected as a conflict.
//!
//! ## Key Invariants
//!
//! - Reads never hit the network and always see local writes
//! - Local state survives every failed call unchanged
//! - Conflicts surface as `KvError::Conflict`; there is no automatic retry,
//!   reload or merge
//!
//! ```rust,no_run
//! use definite_kv::{ClientConfig, DefiniteClient};
//!
//! # fn main() -> definite_kv::KvResult<()> {
//! let client = DefiniteClient::from_config(ClientConfig::resolve(None)?);
//! let mut store = client.kv_store("settings")?;
//! store.set("theme", "dark")?;
//! match store.commit() {
//!     Ok(_) => {}
//!     Err(e) if e.is_conflict() => store.reload()?,
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod http;
mod store;
mod transport;
#[cfg(feature = "ureq")]
mod ureq_client;

pub use client::DefiniteClient;
pub use config::{ClientConfig, API_KEY_ENV_VARS, DEFAULT_API_URL};
pub use error::{KvError, KvResult};
pub use http::{HttpClient, HttpTransport, LoopbackClient, LoopbackServer};
pub use store::{CommitResult, KvStore, StoreState};
pub use transport::{MockCommit, MockTransport, StoreTransport};
#[cfg(feature = "ureq")]
pub use ureq_client::UreqClient;

pub use definite_kv_protocol::{ValidationError, Version};
