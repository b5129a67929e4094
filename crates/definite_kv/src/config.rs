//! Client configuration and credential resolution.

use crate::error::{KvError, KvResult};
use std::time::Duration;

/// Default API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.definite.app";

/// Environment variables consulted for the API key, in precedence order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["DEFINITE_API_KEY", "DEF_API_KEY"];

/// Configuration for a [`DefiniteClient`](crate::DefiniteClient).
#[derive(Clone)]
pub struct ClientConfig {
    /// Bearer credential sent with every request.
    pub api_key: String,
    /// Base URL of the API, without a trailing path.
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Resolves the API key from the process environment.
    ///
    /// See [`ClientConfig::resolve_with`] for the search order.
    pub fn from_env() -> KvResult<Self> {
        Self::resolve(None)
    }

    /// Resolves the API key: `explicit` first, then the process environment.
    pub fn resolve(explicit: Option<String>) -> KvResult<Self> {
        Self::resolve_with(explicit, |name| std::env::var(name).ok())
    }

    /// Resolves the API key using `lookup` in place of the environment.
    ///
    /// Search order: `explicit`, then `DEFINITE_API_KEY`, then `DEF_API_KEY`.
    /// Empty values count as unset.
    pub fn resolve_with<F>(explicit: Option<String>, lookup: F) -> KvResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = explicit
            .filter(|k| !k.is_empty())
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .find_map(|var| lookup(var).filter(|k| !k.is_empty()))
            })
            .ok_or_else(|| {
                KvError::Config(format!(
                    "API key must be provided or set in {} or {} environment variable",
                    API_KEY_ENV_VARS[0], API_KEY_ENV_VARS[1]
                ))
            })?;

        Ok(Self::new(api_key))
    }

    /// Sets the base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
