//! HTTP front for [`KvServer`] built on axum.

use crate::auth::parse_bearer;
use crate::server::KvServer;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method as HttpMethod, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use definite_kv_protocol::{ErrorBody, HttpRequest, Method};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Builds a router that forwards every request to `server`.
pub fn router(server: Arc<KvServer>) -> Router {
    Router::new().fallback(dispatch).with_state(server)
}

/// Serves `server` on an already-bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, server: Arc<KvServer>) -> std::io::Result<()> {
    info!(
        addr = ?listener.local_addr().ok(),
        known_keys = server.config().api_keys.len(),
        max_commit_batch = server.config().max_commit_batch,
        "store server listening"
    );
    axum::serve(listener, router(server)).await
}

async fn dispatch(
    State(server): State<Arc<KvServer>>,
    method: HttpMethod,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(method) = Method::parse(method.as_str()) else {
        let body = ErrorBody::new(format!("unsupported method {}", method));
        return respond(405, body.encode().unwrap_or_default());
    };

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_bearer)
        .map(str::to_string);

    let request = HttpRequest {
        method,
        url: uri.path().to_string(),
        bearer,
        body: body.to_vec(),
    };

    // handle_http only touches the in-memory registry.
    let response = server.handle_http(&request);
    respond(response.status, response.body)
}

fn respond(status: u16, body: Vec<u8>) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if body.is_empty() {
        return status.into_response();
    }
    (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        body,
    )
        .into_response()
}
