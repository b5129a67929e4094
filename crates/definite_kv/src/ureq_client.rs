//! Blocking HTTP client backed by `ureq`.

use crate::http::HttpClient;
use definite_kv_protocol::{HttpRequest, HttpResponse};
use std::io::Read;
use std::time::Duration;

/// [`HttpClient`] over a shared `ureq` agent.
///
/// Non-2xx responses are returned as responses, not errors, so the
/// transport can tell a conflict from a dropped connection.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    /// Creates a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl HttpClient for UreqClient {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let mut call = self.agent.request(request.method.as_str(), &request.url);
        if let Some(authorization) = request.authorization() {
            call = call.set("Authorization", &authorization);
        }

        let result = if request.body.is_empty() {
            call.call()
        } else {
            call.set("Content-Type", "application/json")
                .send_bytes(&request.body)
        };

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => return Err(transport.to_string()),
        };

        let status = response.status();
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| format!("failed to read response body: {}", e))?;

        Ok(HttpResponse::new(status, body))
    }
}
