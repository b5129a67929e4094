//! Get command implementation.

use super::{Client, CommandResult};

/// Prints the value stored under `key`, failing if it is absent.
pub fn run(client: &Client, store: &str, key: &str) -> CommandResult {
    let kv = client.kv_store(store)?;
    match kv.get(key) {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => Err(format!("key {:?} not found in store {:?}", key, store).into()),
    }
}
