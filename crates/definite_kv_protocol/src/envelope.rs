//! Transport-neutral request/response envelope and route table.

use serde::Serialize;
use std::fmt;

/// Path prefix shared by all store endpoints.
pub const STORE_PREFIX: &str = "/v1/store/";

/// Path of the fetch and delete endpoints for a store.
pub fn store_path(name: &str) -> String {
    format!("{}{}", STORE_PREFIX, name)
}

/// Path of the commit endpoint for a store.
pub fn commit_path(name: &str) -> String {
    format!("{}{}/commit", STORE_PREFIX, name)
}

/// HTTP method used by the store endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// DELETE
    Delete,
}

impl Method {
    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }

    /// Parses a wire method name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Absolute URL, or a bare path when routed in-process.
    pub url: String,
    /// Bearer credential for the `Authorization` header.
    pub bearer: Option<String>,
    /// JSON body; empty for GET and DELETE.
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Creates a request without a body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            bearer: None,
            body: Vec::new(),
        }
    }

    /// Attaches a bearer credential.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Attaches a JSON body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Returns the path portion of the URL, without scheme, host or query.
    pub fn path(&self) -> &str {
        let without_query = self.url.split('?').next().unwrap_or("");
        match without_query.find("://") {
            Some(scheme_end) => {
                let rest = &without_query[scheme_end + 3..];
                rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
            }
            None => without_query,
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> Option<String> {
        self.bearer.as_ref().map(|t| format!("Bearer {}", t))
    }
}

/// A received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Raw body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Creates a response with a JSON-serialized body.
    pub fn json<T: Serialize>(status: u16, value: &T) -> serde_json::Result<Self> {
        Ok(Self::new(status, serde_json::to_vec(value)?))
    }

    /// Creates a response without a body.
    pub fn empty(status: u16) -> Self {
        Self::new(status, Vec::new())
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as lossy UTF-8, for error messages.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A resolved store endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `GET /v1/store/{name}`
    Fetch(String),
    /// `POST /v1/store/{name}/commit`
    Commit(String),
    /// `DELETE /v1/store/{name}`
    DeleteStore(String),
}

impl Route {
    /// Resolves a method and path to a route.
    pub fn resolve(method: Method, path: &str) -> Option<Route> {
        let rest = path.strip_prefix(STORE_PREFIX)?;
        let rest = rest.trim_end_matches('/');
        match (method, rest.split_once('/')) {
            (Method::Get, None) if !rest.is_empty() => Some(Route::Fetch(rest.to_string())),
            (Method::Delete, None) if !rest.is_empty() => {
                Some(Route::DeleteStore(rest.to_string()))
            }
            (Method::Post, Some((name, "commit"))) if !name.is_empty() => {
                Some(Route::Commit(name.to_string()))
            }
            _ => None,
        }
    }

    /// Store name the route addresses.
    pub fn store(&self) -> &str {
        match self {
            Route::Fetch(name) | Route::Commit(name) | Route::DeleteStore(name) => name,
        }
    }
}
