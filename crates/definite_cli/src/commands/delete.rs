//! Delete command implementation.

use super::{Client, CommandResult};
use tracing::info;

/// Removes one key and commits the removal.
pub fn run(client: &Client, store: &str, key: &str) -> CommandResult {
    let mut kv = client.kv_store(store)?;
    if !kv.contains(key) {
        return Err(format!("key {:?} not found in store {:?}", key, store).into());
    }
    kv.delete(key)?;

    let result = kv.commit().map_err(|e| {
        if e.is_conflict() {
            format!("store {:?} changed while deleting; try again", store)
        } else {
            e.to_string()
        }
    })?;

    info!(store, key, version = ?result.version, "key deleted");
    Ok(())
}
