//! Blocking `Transport` backed by ureq.
//!
//! ureq's status-as-error behavior is disabled so 4xx/5xx responses reach
//! the client as data and keep their `x-error` headers. Response bodies
//! are read whole with no size cap unless one is set with
//! [`UreqTransport::with_body_limit`].

use std::time::Duration;

use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    body_limit: u64,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    /// Bound the whole round-trip, body read included. This is the only
    /// way to abandon an in-flight call.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self {
            agent,
            body_limit: u64::MAX,
        }
    }

    /// Cap the response body at `bytes`. A larger body fails the call with
    /// `TransportError`.
    pub fn with_body_limit(mut self, bytes: u64) -> Self {
        self.body_limit = bytes;
        self
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .send(request.body.as_bytes())
            .map_err(|e| ApiError::TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_string()
            .map_err(|e| ApiError::TransportError(e.to_string()))?;

        debug!(url = %request.url, status, bytes = body.len(), "response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
