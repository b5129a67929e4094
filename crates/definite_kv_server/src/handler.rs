//! Request handlers for store endpoints.

use crate::auth::BearerAuth;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::registry::StoreRegistry;
use definite_kv_protocol::{
    validate_key, validate_store_name, CommitRequest, CommitResponse, SnapshotResponse, Version,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Context for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Store registry (shared across all handlers).
    pub registry: Arc<StoreRegistry>,
    /// Token to tenant mapping.
    pub auth: BearerAuth,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(config: ServerConfig, registry: Arc<StoreRegistry>) -> Self {
        let auth = BearerAuth::new(&config);
        Self {
            config,
            registry,
            auth,
        }
    }
}

/// Handler for store requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Handles a fetch request.
    pub fn handle_fetch(&self, tenant: &str, store: &str) -> ServerResult<SnapshotResponse> {
        validate_store_name(store)?;

        let record = self
            .context
            .registry
            .get(tenant, store)
            .ok_or_else(|| ServerError::StoreNotFound(store.to_string()))?;

        debug!(tenant, store, version = record.version, "fetch");
        Ok(SnapshotResponse::new(
            record.entries,
            Some(Version::Number(record.version)),
        ))
    }

    /// Handles a commit request.
    pub fn handle_commit(
        &self,
        tenant: &str,
        store: &str,
        request: CommitRequest,
    ) -> ServerResult<CommitResponse> {
        validate_store_name(store)?;

        let max = self.context.config.max_commit_batch;
        if request.change_count() > max {
            return Err(ServerError::InvalidRequest(format!(
                "Too many changes: {} > {}",
                request.change_count(),
                max
            )));
        }
        for key in request.upserts.keys().chain(request.deletes.iter()) {
            validate_key(key)?;
        }

        let changes = request.change_count();
        match self.context.registry.commit(
            tenant,
            store,
            request.version_id.as_ref(),
            request.upserts,
            &request.deletes,
        ) {
            Ok(version) => {
                info!(tenant, store, changes, version, "commit applied");
                Ok(CommitResponse::new(version))
            }
            Err(err @ ServerError::VersionConflict { .. }) => {
                warn!(tenant, store, error = %err, "commit rejected");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Handles a store deletion.
    pub fn handle_delete(&self, tenant: &str, store: &str) -> ServerResult<()> {
        validate_store_name(store)?;

        if self.context.registry.drop_store(tenant, store) {
            info!(tenant, store, "store dropped");
            Ok(())
        } else {
            Err(ServerError::StoreNotFound(store.to_string()))
        }
    }
}
