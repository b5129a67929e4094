//! Set command implementation.

use super::{Client, CommandResult};
use tracing::info;

/// Writes one key and commits it.
pub fn run(client: &Client, store: &str, key: &str, value: &str) -> CommandResult {
    let mut kv = client.kv_store(store)?;
    kv.set(key, value)?;

    let result = kv.commit().map_err(|e| {
        if e.is_conflict() {
            format!("store {:?} changed while writing; try again", store)
        } else {
            e.to_string()
        }
    })?;

    info!(store, key, version = ?result.version, "value written");
    Ok(())
}
