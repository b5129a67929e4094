//! CLI command implementations.

pub mod delete;
pub mod drop;
pub mod get;
pub mod list;
pub mod serve;
pub mod set;

use definite_kv::{DefiniteClient, HttpTransport, UreqClient};

/// Client type used by every remote command.
pub type Client = DefiniteClient<HttpTransport<UreqClient>>;

/// Result type shared by the commands.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
