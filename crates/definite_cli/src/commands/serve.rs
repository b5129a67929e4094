//! Serve command implementation.

use super::CommandResult;
use definite_kv_server::{serve, KvServer, ServerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Parses a `KEY=TENANT` pair.
pub fn parse_key_mapping(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, tenant)) if !key.is_empty() && !tenant.is_empty() => {
            Ok((key.to_string(), tenant.to_string()))
        }
        _ => Err(format!("expected KEY=TENANT, got {:?}", raw)),
    }
}

/// Runs the reference server until interrupted.
pub fn run(bind: SocketAddr, key_map: &[(String, String)]) -> CommandResult {
    let mut config = ServerConfig::new(bind);
    for (key, tenant) in key_map {
        config = config.with_api_key(key.clone(), tenant.clone());
    }
    if !config.requires_known_keys() {
        info!("no API keys configured; every bearer token is its own tenant");
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let server = Arc::new(KvServer::new(config));

        tokio::select! {
            result = serve(listener, server) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                Ok(())
            }
        }
    })?;

    Ok(())
}
