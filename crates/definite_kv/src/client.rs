//! Entry point tying configuration, transport and stores together.

use crate::error::KvResult;
use crate::store::KvStore;
use crate::transport::StoreTransport;
use std::sync::Arc;

#[cfg(feature = "ureq")]
use crate::{config::ClientConfig, http::HttpTransport, ureq_client::UreqClient};

/// Client for the Definite API.
///
/// Every store opened from one client shares its transport and credential.
pub struct DefiniteClient<T: StoreTransport> {
    transport: Arc<T>,
}

#[cfg(feature = "ureq")]
impl DefiniteClient<HttpTransport<UreqClient>> {
    /// Creates a client that talks HTTP using `config`.
    pub fn from_config(config: ClientConfig) -> Self {
        let client = UreqClient::new(config.timeout);
        Self::with_transport(HttpTransport::new(config.api_url, config.api_key, client))
    }

    /// Creates a client whose API key comes from the environment.
    pub fn from_env() -> KvResult<Self> {
        Ok(Self::from_config(ClientConfig::from_env()?))
    }
}

impl<T: StoreTransport> DefiniteClient<T> {
    /// Creates a client over an existing transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Returns the shared transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Opens the named key-value store.
    ///
    /// Each call fetches a fresh snapshot; instances are independent.
    pub fn kv_store(&self, name: &str) -> KvResult<KvStore<T>> {
        KvStore::open(name, Arc::clone(&self.transport))
    }
}

impl<T: StoreTransport> Clone for DefiniteClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}
