//! Server-side store registry.

use crate::error::{ServerError, ServerResult};
use definite_kv_protocol::Version;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Contents and version of one store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreRecord {
    /// Key/value pairs.
    pub entries: BTreeMap<String, String>,
    /// Version of the last commit.
    pub version: u64,
}

struct RegistryInner {
    /// (tenant, store name) -> record.
    stores: HashMap<(String, String), StoreRecord>,
    /// Next version to hand out. Shared by all stores and never reset.
    next_version: u64,
}

/// All stores known to the server.
///
/// The registry maintains:
/// - Every store's entries and current version
/// - A registry-wide version counter, so a version is never handed out
///   twice even after its store is dropped and recreated
pub struct StoreRegistry {
    inner: RwLock<RegistryInner>,
}

impl StoreRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                stores: HashMap::new(),
                next_version: 1,
            }),
        }
    }

    fn key(tenant: &str, name: &str) -> (String, String) {
        (tenant.to_string(), name.to_string())
    }

    /// Returns a copy of a store, if it exists.
    pub fn get(&self, tenant: &str, name: &str) -> Option<StoreRecord> {
        self.inner.read().stores.get(&Self::key(tenant, name)).cloned()
    }

    /// Returns a store's current version, if it exists.
    pub fn version(&self, tenant: &str, name: &str) -> Option<u64> {
        self.inner
            .read()
            .stores
            .get(&Self::key(tenant, name))
            .map(|r| r.version)
    }

    /// Applies a batch if `expected` is the store's current version.
    ///
    /// `None` matches only a store that does not exist; the commit then
    /// creates it. The check and the writes happen under one lock, so a
    /// batch is applied entirely or not at all. Returns the new version.
    pub fn commit(
        &self,
        tenant: &str,
        name: &str,
        expected: Option<&Version>,
        upserts: BTreeMap<String, String>,
        deletes: &[String],
    ) -> ServerResult<u64> {
        let mut inner = self.inner.write();
        let key = Self::key(tenant, name);

        let current = inner.stores.get(&key).map(|r| r.version);
        let matches = match (expected, current) {
            (None, None) => true,
            (Some(expected), Some(current)) => expected.as_number() == Some(current),
            _ => false,
        };
        if !matches {
            return Err(ServerError::VersionConflict {
                current,
                actual: expected.cloned(),
            });
        }

        let version = inner.next_version;
        inner.next_version += 1;

        let record = inner.stores.entry(key).or_default();
        record.entries.extend(upserts);
        for k in deletes {
            record.entries.remove(k);
        }
        record.version = version;

        Ok(version)
    }

    /// Removes a store. Returns false if it did not exist.
    pub fn drop_store(&self, tenant: &str, name: &str) -> bool {
        self.inner
            .write()
            .stores
            .remove(&Self::key(tenant, name))
            .is_some()
    }

    /// Returns the number of stores across all tenants.
    pub fn len(&self) -> usize {
        self.inner.read().stores.len()
    }

    /// Returns true if there are no stores.
    pub fn is_empty(&self) -> bool {
        self.inner.read().stores.is_empty()
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}
