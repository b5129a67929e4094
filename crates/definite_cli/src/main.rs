//! Definite CLI
//!
//! Command-line access to Definite key-value stores.
//!
//! # Commands
//!
//! - `get` - Print one value
//! - `set` - Write one value and commit
//! - `delete` - Remove one key and commit
//! - `list` - Print every key in a store
//! - `drop` - Delete a whole store
//! - `serve` - Run the in-memory reference server

mod commands;

use clap::{Parser, Subcommand};
use commands::Client;
use definite_kv::{ClientConfig, DefiniteClient};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Definite key-value store tools.
#[derive(Parser)]
#[command(name = "definite")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// API key (falls back to DEFINITE_API_KEY, then DEF_API_KEY)
    #[arg(global = true, long)]
    api_key: Option<String>,

    /// Base URL of the API
    #[arg(global = true, long)]
    api_url: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value of a key
    Get {
        /// Store name
        store: String,
        /// Key to read
        key: String,
    },

    /// Set a key and commit
    Set {
        /// Store name
        store: String,
        /// Key to write
        key: String,
        /// New value
        value: String,
    },

    /// Delete a key and commit
    Delete {
        /// Store name
        store: String,
        /// Key to remove
        key: String,
    },

    /// List every key in a store
    List {
        /// Store name
        store: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Delete a whole store
    Drop {
        /// Store name
        store: String,
    },

    /// Run the in-memory reference server
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Accepted API key and its tenant, as KEY=TENANT (repeatable)
        #[arg(long = "api-key-map", value_parser = commands::serve::parse_key_mapping)]
        api_key_map: Vec<(String, String)>,
    },

    /// Show version information
    Version,
}

fn connect(
    api_key: Option<String>,
    api_url: Option<String>,
) -> Result<Client, Box<dyn std::error::Error>> {
    let mut config = ClientConfig::resolve(api_key)?;
    if let Some(url) = api_url {
        config = config.with_api_url(url);
    }
    Ok(DefiniteClient::from_config(config))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Get { store, key } => {
            let client = connect(cli.api_key, cli.api_url)?;
            commands::get::run(&client, &store, &key)?;
        }
        Commands::Set { store, key, value } => {
            let client = connect(cli.api_key, cli.api_url)?;
            commands::set::run(&client, &store, &key, &value)?;
        }
        Commands::Delete { store, key } => {
            let client = connect(cli.api_key, cli.api_url)?;
            commands::delete::run(&client, &store, &key)?;
        }
        Commands::List { store, format } => {
            let client = connect(cli.api_key, cli.api_url)?;
            commands::list::run(&client, &store, &format)?;
        }
        Commands::Drop { store } => {
            let client = connect(cli.api_key, cli.api_url)?;
            commands::drop::run(&client, &store)?;
        }
        Commands::Serve { bind, api_key_map } => {
            commands::serve::run(bind, &api_key_map)?;
        }
        Commands::Version => {
            println!("Definite CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
