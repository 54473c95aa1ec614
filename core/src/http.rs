//! HTTP transport types and the blocking transport used in production.
//!
//! # Design
//! Requests and responses are plain data. `Client::build_call` produces an
//! `HttpRequest` and `Client::parse_call` classifies an `HttpResponse`
//! without touching the network; a `Transport` performs the round-trip in
//! between. Tests substitute a scripted transport, production uses
//! `UreqTransport`.

use std::time::Duration;

use tracing::debug;

use crate::error::TransportError;

/// Largest response body `UreqTransport` reads.
pub const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// An HTTP request described as plain data. Every vendor call is a POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or("")
    }

    pub fn is_json(&self) -> bool {
        self.content_type().contains("application/json")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one HTTP round-trip.
///
/// Implementations return every received response as `Ok`, whatever its
/// status. `Err` is for failures where no response arrived, except
/// `TransportError::Body` for a response whose body could not be read.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// A [`Transport`] backed by a blocking `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(timeout)
            // Status codes are classified by the client.
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(url = %request.url, bytes = request.body.len(), "sending request");

        let mut builder = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder.send(&request.body[..]).map_err(map_ureq_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| TransportError::Body(e.to_string()))?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::HostNotFound => TransportError::Connection("host not found".to_string()),
        ureq::Error::ConnectionFailed => TransportError::Connection("connection failed".to_string()),
        ureq::Error::Io(e) => TransportError::Connection(e.to_string()),
        other => TransportError::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(headers: Vec<(&str, &str)>, status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: String::new(),
        }
    }

    #[test]
    fn content_type_lookup_ignores_case() {
        let resp = response(vec![("Content-Type", "application/json; charset=utf-8")], 200);
        assert!(resp.is_json());
    }

    #[test]
    fn missing_content_type_is_not_json() {
        let resp = response(Vec::new(), 200);
        assert_eq!(resp.content_type(), "");
        assert!(!resp.is_json());
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(response(Vec::new(), 200).is_success());
        assert!(response(Vec::new(), 299).is_success());
        assert!(!response(Vec::new(), 300).is_success());
        assert!(!response(Vec::new(), 199).is_success());
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let transport = UreqTransport::new(Some(Duration::from_secs(1)));
        let request = HttpRequest {
            url: "http://127.0.0.1:9/en/api/getLists?format=json".to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        };
        assert!(transport.send(&request).is_err());
    }

    #[test]
    fn oversized_body_is_a_body_error() {
        let (addr, _hits) = crate::testing::serve_oversized_body();
        let transport = UreqTransport::new(Some(Duration::from_secs(5)));
        let request = HttpRequest {
            url: format!("http://{addr}/en/api/getLists?format=json"),
            headers: Vec::new(),
            body: b"api_key=k".to_vec(),
        };
        let err = transport.send(&request).unwrap_err();
        assert!(matches!(err, TransportError::Body(_)));
        assert!(!err.is_retryable());
    }
}
