//! Main store server.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler};
use crate::registry::StoreRegistry;
use definite_kv_protocol::{CommitRequest, ErrorBody, HttpRequest, HttpResponse, Route, Version};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// The store server.
///
/// This server answers fetch, commit and delete requests for any number
/// of tenants and stores, holding everything in memory.
///
/// # Example
///
/// ```
/// use definite_kv_protocol::{HttpRequest, Method};
/// use definite_kv_server::{KvServer, ServerConfig};
///
/// let server = KvServer::new(ServerConfig::default());
/// let request = HttpRequest::new(Method::Get, "/v1/store/settings").with_bearer("key");
///
/// // A store that was never committed does not exist yet.
/// assert_eq!(server.handle_http(&request).status, 404);
/// ```
pub struct KvServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl KvServer {
    /// Creates a new store server.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registry(config, Arc::new(StoreRegistry::new()))
    }

    /// Creates a store server with an existing registry.
    pub fn with_registry(config: ServerConfig, registry: Arc<StoreRegistry>) -> Self {
        let context = Arc::new(HandlerContext::new(config, registry));
        let handler = RequestHandler::new(Arc::clone(&context));

        Self { handler, context }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Handles a request envelope, always producing a response.
    pub fn handle_http(&self, request: &HttpRequest) -> HttpResponse {
        debug!(method = %request.method, path = request.path(), "request");
        self.dispatch(request).unwrap_or_else(|err| {
            if err.is_server_error() {
                error!(
                    method = %request.method,
                    path = request.path(),
                    error = %err,
                    "request failed"
                );
            } else if err.is_client_error() {
                debug!(status = err.status_code(), error = %err, "request rejected");
            }
            error_response(&err)
        })
    }

    fn dispatch(&self, request: &HttpRequest) -> ServerResult<HttpResponse> {
        let tenant = self.context.auth.tenant_for(request.bearer.as_deref())?;

        let path = request.path();
        let route = Route::resolve(request.method, path)
            .ok_or_else(|| ServerError::NoRoute(format!("{} {}", request.method, path)))?;
        debug!(tenant = %tenant, store = route.store(), "routed");

        match route {
            Route::Fetch(store) => json(200, &self.handler.handle_fetch(&tenant, &store)?),
            Route::Commit(store) => {
                let commit = CommitRequest::decode(&request.body).map_err(|e| {
                    ServerError::InvalidRequest(format!("malformed commit body: {}", e))
                })?;
                json(200, &self.handler.handle_commit(&tenant, &store, commit)?)
            }
            Route::DeleteStore(store) => {
                self.handler.handle_delete(&tenant, &store)?;
                Ok(HttpResponse::empty(204))
            }
        }
    }

    /// Returns the current version of a store.
    pub fn version_of(&self, tenant: &str, store: &str) -> Option<u64> {
        self.context.registry.version(tenant, store)
    }

    /// Returns the number of stores across all tenants.
    pub fn store_count(&self) -> usize {
        self.context.registry.len()
    }
}

fn json<T: Serialize>(status: u16, value: &T) -> ServerResult<HttpResponse> {
    HttpResponse::json(status, value).map_err(|e| ServerError::Internal(e.to_string()))
}

fn error_response(err: &ServerError) -> HttpResponse {
    let body = match err {
        ServerError::VersionConflict { current, .. } => {
            ErrorBody::conflict(err.to_string(), current.map(Version::Number))
        }
        ServerError::StoreNotFound(_) => ErrorBody::store_not_found(err.to_string()),
        _ => ErrorBody::new(err.to_string()),
    };
    HttpResponse::new(err.status_code(), body.encode().unwrap_or_default())
}
