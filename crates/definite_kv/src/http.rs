//! HTTP transport implementation.
//!
//! This module provides an HTTP-based transport for store operations.
//! The actual HTTP client is abstracted via a trait so the transport can
//! run over `ureq`, or be routed in-process to a server for tests.

use crate::error::{KvError, KvResult};
use crate::transport::StoreTransport;
use definite_kv_protocol::{
    commit_path, store_path, CommitRequest, CommitResponse, ErrorBody, HttpRequest, HttpResponse,
    Method, SnapshotResponse, Version,
};
use parking_lot::RwLock;
use tracing::debug;

/// HTTP client abstraction.
///
/// Implementations send one request and return whatever response came
/// back, including non-2xx ones. `Err` is reserved for failures where no
/// response was received.
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String>;
}

/// HTTP-based store transport.
///
/// Uses JSON request/response bodies and a bearer credential.
pub struct HttpTransport<C: HttpClient> {
    /// Base URL of the API (e.g., "https://api.definite.app").
    base_url: String,
    /// Bearer credential.
    api_key: String,
    /// HTTP client implementation.
    client: C,
    /// Last transport error message.
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn request(&self, method: Method, path: &str) -> HttpRequest {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        HttpRequest::new(method, url).with_bearer(self.api_key.clone())
    }

    fn send(&self, request: HttpRequest) -> KvResult<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "sending store request");

        let response = self.client.send(&request).map_err(|e| {
            *self.last_error.write() = Some(e.clone());
            KvError::Transport(e)
        })?;
        *self.last_error.write() = None;

        debug!(status = response.status, "received store response");
        Ok(response)
    }
}

/// Splits an error response into its message and reported version.
fn error_details(response: &HttpResponse) -> (String, Option<Version>) {
    match ErrorBody::decode(&response.body) {
        Ok(body) => (body.error, body.current_version_id),
        Err(_) => (response.body_text(), None),
    }
}

/// Maps a non-2xx response that is not a version conflict.
fn status_error(store: &str, response: &HttpResponse) -> KvError {
    let (message, _) = error_details(response);
    match response.status {
        401 | 403 => KvError::Unauthorized(message),
        404 => KvError::NotFound(format!("store {}: {}", store, message)),
        status => KvError::Server { status, message },
    }
}

/// Returns true if the response says the store itself does not exist.
///
/// Any other 404, such as one from a misrouted base URL, is an error.
fn is_store_absent(response: &HttpResponse) -> bool {
    response.status == 404
        && ErrorBody::decode(&response.body)
            .map(|body| body.is_store_not_found())
            .unwrap_or(false)
}

fn decode_error(what: &str, err: serde_json::Error) -> KvError {
    KvError::Protocol(format!("failed to decode {}: {}", what, err))
}

impl<C: HttpClient> StoreTransport for HttpTransport<C> {
    fn fetch(&self, store: &str) -> KvResult<SnapshotResponse> {
        let response = self.send(self.request(Method::Get, &store_path(store)))?;

        match response.status {
            _ if is_store_absent(&response) => Ok(SnapshotResponse::empty()),
            _ if response.is_success() => SnapshotResponse::decode(&response.body)
                .map_err(|e| decode_error("snapshot", e)),
            _ => Err(status_error(store, &response)),
        }
    }

    fn commit(&self, store: &str, request: &CommitRequest) -> KvResult<CommitResponse> {
        let body = request
            .encode()
            .map_err(|e| KvError::Protocol(format!("failed to encode commit: {}", e)))?;
        let response = self.send(self.request(Method::Post, &commit_path(store)).with_body(body))?;

        match response.status {
            409 => {
                let (_, current) = error_details(&response);
                Err(KvError::Conflict {
                    store: store.to_string(),
                    expected: request.version_id.clone(),
                    current,
                })
            }
            _ if response.is_success() => CommitResponse::decode(&response.body)
                .map_err(|e| decode_error("commit response", e)),
            _ => Err(status_error(store, &response)),
        }
    }

    fn delete_store(&self, store: &str) -> KvResult<()> {
        let response = self.send(self.request(Method::Delete, &store_path(store)))?;

        if response.is_success() || is_store_absent(&response) {
            Ok(())
        } else {
            Err(status_error(store, &response))
        }
    }
}

/// A loopback HTTP client that routes requests directly to a server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer: Send + Sync {
    /// Handles a request and returns the response.
    fn handle(&self, request: &HttpRequest) -> HttpResponse;
}

impl<F> LoopbackServer for F
where
    F: Fn(&HttpRequest) -> HttpResponse + Send + Sync,
{
    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        self(request)
    }
}

impl<S: LoopbackServer> HttpClient for LoopbackClient<S> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        Ok(self.server.handle(request))
    }
}
