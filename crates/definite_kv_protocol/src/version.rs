//! Version tokens.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token naming the server state a snapshot was taken from.
///
/// Servers may hand out integers or strings; clients only ever compare
/// tokens for equality and echo them back. `Number(1)` and `Text("1")`
/// are different tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Version {
    /// Counter-style token.
    Number(u64),
    /// Etag-style token.
    Text(String),
}

impl Version {
    /// Returns the counter value, if this is a numeric token.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Version::Number(n) => Some(*n),
            Version::Text(_) => None,
        }
    }
}

impl From<u64> for Version {
    fn from(n: u64) -> Self {
        Version::Number(n)
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Version::Text(s.to_string())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Number(n) => write!(f, "{}", n),
            Version::Text(s) => f.write_str(s),
        }
    }
}
