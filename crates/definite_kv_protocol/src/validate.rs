//! Store name and key validation.
//!
//! Both sides run the same checks: the client before anything is recorded
//! or sent, the server before touching its registry.

use thiserror::Error;

/// Maximum length of a store name, in characters.
pub const MAX_STORE_NAME_LEN: usize = 128;

/// Maximum length of a key, in bytes.
pub const MAX_KEY_BYTES: usize = 1024;

/// Malformed store name or key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Store name is empty.
    #[error("store name must not be empty")]
    EmptyStoreName,

    /// Store name is too long.
    #[error("store name is {len} characters, maximum is {max}")]
    StoreNameTooLong {
        /// Actual length.
        len: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Store name contains a character outside `[A-Za-z0-9_.-]`.
    #[error("store name {name:?} contains invalid character {ch:?}")]
    InvalidStoreName {
        /// The rejected name.
        name: String,
        /// First offending character.
        ch: char,
    },

    /// Store name is made only of dots, which URL normalization rewrites.
    #[error("store name {0:?} must contain a character other than '.'")]
    DotsOnlyStoreName(String),

    /// Key is empty.
    #[error("key must not be empty")]
    EmptyKey,

    /// Key is too long.
    #[error("key is {len} bytes, maximum is {max}")]
    KeyTooLong {
        /// Actual length.
        len: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Key contains a control character.
    #[error("key contains control character {ch:?}")]
    ControlCharInKey {
        /// First offending character.
        ch: char,
    },
}

/// Checks that `name` can address a store.
pub fn validate_store_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyStoreName);
    }
    let len = name.chars().count();
    if len > MAX_STORE_NAME_LEN {
        return Err(ValidationError::StoreNameTooLong {
            len,
            max: MAX_STORE_NAME_LEN,
        });
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(ValidationError::InvalidStoreName {
            name: name.to_string(),
            ch,
        });
    }
    if name.chars().all(|c| c == '.') {
        return Err(ValidationError::DotsOnlyStoreName(name.to_string()));
    }
    Ok(())
}

/// Checks that `key` can be stored.
pub fn validate_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::EmptyKey);
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(ValidationError::KeyTooLong {
            len: key.len(),
            max: MAX_KEY_BYTES,
        });
    }
    if let Some(ch) = key.chars().find(|c| c.is_control()) {
        return Err(ValidationError::ControlCharInKey { ch });
    }
    Ok(())
}
