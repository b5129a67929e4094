//! Bearer-token authentication.
//!
//! Every request carries `Authorization: Bearer <api key>`. The key decides
//! the tenant, and store names are scoped per tenant, so two keys of
//! different tenants never see each other's stores.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use std::collections::HashMap;

/// Extracts the token from an `Authorization` header value.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Maps bearer tokens to tenants.
#[derive(Clone)]
pub struct BearerAuth {
    api_keys: HashMap<String, String>,
}

impl BearerAuth {
    /// Creates an authenticator from the server configuration.
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            api_keys: config.api_keys.clone(),
        }
    }

    /// Resolves the tenant for a request's token.
    ///
    /// With no keys configured, the token itself names the tenant.
    pub fn tenant_for(&self, token: Option<&str>) -> ServerResult<String> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServerError::NotAuthorized("missing bearer token".into()))?;

        if self.api_keys.is_empty() {
            return Ok(token.to_string());
        }

        self.api_keys
            .get(token)
            .cloned()
            .ok_or_else(|| ServerError::NotAuthorized("unknown API key".into()))
    }
}
