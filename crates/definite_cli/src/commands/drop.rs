//! Drop command implementation.

use super::{Client, CommandResult};
use tracing::info;

/// Deletes a whole store.
pub fn run(client: &Client, store: &str) -> CommandResult {
    let mut kv = client.kv_store(store)?;
    let keys = kv.len();
    kv.delete_store()?;

    info!(store, keys, "store dropped");
    Ok(())
}
