//! List command implementation.

use super::{Client, CommandResult};
use definite_kv::Version;
use serde::Serialize;
use std::collections::BTreeMap;

/// Store listing.
#[derive(Debug, Serialize)]
pub struct ListResult {
    /// Store name.
    pub store: String,
    /// Version the listing was taken at, if the store exists.
    pub version: Option<Version>,
    /// Every key and its value.
    pub entries: BTreeMap<String, String>,
}

/// Runs the list command.
pub fn run(client: &Client, store: &str, format: &str) -> CommandResult {
    let kv = client.kv_store(store)?;
    let result = ListResult {
        store: kv.name().to_string(),
        version: kv.version().cloned(),
        entries: kv.to_map(),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &ListResult) {
    match &result.version {
        Some(version) => println!("Store: {} (version {})", result.store, version),
        None => println!("Store: {} (not created)", result.store),
    }
    println!("Keys:  {}", result.entries.len());

    if result.entries.is_empty() {
        return;
    }
    println!();

    let width = result.entries.keys().map(|k| k.len()).max().unwrap_or(0);
    for (key, value) in &result.entries {
        println!("  {:width$}  {}", key, value, width = width);
    }
}
