//! Protocol messages for the store endpoints.

use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

macro_rules! json_codec {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $ty {
                /// Encodes to a JSON body.
                pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
                    serde_json::to_vec(self)
                }

                /// Decodes from a JSON body.
                pub fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
                    serde_json::from_slice(bytes)
                }
            }
        )*
    };
}

json_codec!(SnapshotResponse, CommitRequest, CommitResponse, ErrorBody);

/// Error code of a 404 meaning the addressed store does not exist.
///
/// A 404 without it is a routing miss, not an absent store.
pub const STORE_NOT_FOUND: &str = "store_not_found";

/// Full contents of a store, as returned by a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotResponse {
    /// Every key/value pair in the store.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    /// Version the data corresponds to. `None` for a never-committed store.
    #[serde(default)]
    pub version_id: Option<Version>,
}

impl SnapshotResponse {
    /// Creates a snapshot response.
    pub fn new(data: BTreeMap<String, String>, version_id: Option<Version>) -> Self {
        Self { data, version_id }
    }

    /// The snapshot of a store that does not exist yet.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A batch of changes guarded by the version the client last saw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    /// Version the changes were made against.
    #[serde(default)]
    pub version_id: Option<Version>,
    /// Keys to insert or overwrite.
    #[serde(default)]
    pub upserts: BTreeMap<String, String>,
    /// Keys to remove. Keys absent on the server are ignored.
    #[serde(default)]
    pub deletes: Vec<String>,
}

impl CommitRequest {
    /// Creates a commit request.
    pub fn new(
        version_id: Option<Version>,
        upserts: BTreeMap<String, String>,
        deletes: Vec<String>,
    ) -> Self {
        Self {
            version_id,
            upserts,
            deletes,
        }
    }

    /// Number of individual changes carried by this request.
    pub fn change_count(&self) -> usize {
        self.upserts.len() + self.deletes.len()
    }

    /// Returns true if the request carries no changes.
    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }
}

/// Successful commit acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResponse {
    /// The store's new version.
    pub version_id: Version,
}

impl CommitResponse {
    /// Creates a commit response.
    pub fn new(version_id: impl Into<Version>) -> Self {
        Self {
            version_id: version_id.into(),
        }
    }
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable error code, e.g. [`STORE_NOT_FOUND`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Server's current version, reported on commit conflicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version_id: Option<Version>,
}

impl ErrorBody {
    /// Creates an error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
            current_version_id: None,
        }
    }

    /// Creates the body of a 404 for a store that does not exist.
    pub fn store_not_found(error: impl Into<String>) -> Self {
        Self {
            code: Some(STORE_NOT_FOUND.to_string()),
            ..Self::new(error)
        }
    }

    /// Returns true if the body reports an absent store.
    pub fn is_store_not_found(&self) -> bool {
        self.code.as_deref() == Some(STORE_NOT_FOUND)
    }

    /// Creates a conflict body carrying the server's version.
    pub fn conflict(error: impl Into<String>, current: Option<Version>) -> Self {
        Self {
            current_version_id: current,
            ..Self::new(error)
        }
    }
}
