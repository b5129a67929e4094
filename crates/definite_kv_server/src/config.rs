//! Server configuration.

use std::collections::HashMap;
use std::net::SocketAddr;

/// Configuration for the store server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Accepted API keys, mapped to the tenant that owns their stores.
    /// Empty means any bearer token is accepted and acts as its own tenant.
    pub api_keys: HashMap<String, String>,
    /// Maximum upserts plus deletes in one commit.
    pub max_commit_batch: usize,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            api_keys: HashMap::new(),
            max_commit_batch: 10_000,
        }
    }

    /// Accepts `api_key` on behalf of `tenant`.
    pub fn with_api_key(mut self, api_key: impl Into<String>, tenant: impl Into<String>) -> Self {
        self.api_keys.insert(api_key.into(), tenant.into());
        self
    }

    /// Sets the maximum commit batch size.
    pub fn with_max_commit_batch(mut self, size: usize) -> Self {
        self.max_commit_batch = size;
        self
    }

    /// Returns true if only configured API keys are accepted.
    pub fn requires_known_keys(&self) -> bool {
        !self.api_keys.is_empty()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 8080)))
    }
}
