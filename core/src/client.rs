//! Request builder, response classifier and retrying caller for the vendor API.
//!
//! # Design
//! `Client` owns its `ClientConfig` and a `Transport`, and carries no mutable
//! state between calls. A call is split into `build_call` (produces the
//! `HttpRequest`), the transport round-trip, and `parse_call` (classifies the
//! `HttpResponse` into a result plus log entries). Only the round-trip is
//! retried: a response that arrived, however bad, ends the call.

use std::fmt;

use serde_json::{json, Map, Value};
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::{OrmError, Result};
use crate::form;
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::log::{RequestLog, Response};
use crate::method::Method;

/// Blocking client for the vendor API.
///
/// Holds a configuration and a `Transport`; each call returns a `Response`
/// with its own `RequestLog`.
pub struct Client {
    config: ClientConfig,
    transport: Box<dyn Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_host", &self.config.api_host())
            .field("retry_count", &self.config.retry_count)
            .field("error_policy", &self.config.error_policy)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    /// Client over a blocking `ureq` agent using the configured timeout.
    pub fn with_ureq(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout());
        Self::new(config, transport)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Parameters as sent: caller params plus `platform`, without the key.
    fn outgoing_params(&self, params: &Map<String, Value>) -> Map<String, Value> {
        let mut outgoing = params.clone();
        if let Some(platform) = self.config.platform() {
            outgoing.insert("platform".to_string(), Value::String(platform.to_string()));
        }
        outgoing
    }

    pub fn build_call(&self, method: &str, params: &Map<String, Value>) -> Result<HttpRequest> {
        let mut outgoing = self.outgoing_params(params);
        outgoing.insert(
            "api_key".to_string(),
            Value::String(self.config.api_key.clone()),
        );

        let encoding = if self.config.is_utf8() {
            "UTF-8"
        } else {
            self.config.encoding.as_str()
        };
        let body = form::encode_params(&outgoing, encoding)?;

        let mut url = format!("{}{method}?format=json", self.config.api_host());
        let body = self.maybe_compress(&mut url, body)?;

        Ok(HttpRequest {
            url,
            headers: vec![(
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            body,
        })
    }

    #[cfg(feature = "compression")]
    fn maybe_compress(&self, url: &mut String, body: String) -> Result<Vec<u8>> {
        if !self.config.compression {
            return Ok(body.into_bytes());
        }
        url.push_str("&request_compression=bzip2");
        form::compress(body.as_bytes())
    }

    #[cfg(not(feature = "compression"))]
    fn maybe_compress(&self, _url: &mut String, body: String) -> Result<Vec<u8>> {
        Ok(body.into_bytes())
    }

    /// Classify a received response.
    ///
    /// Failures are written to `log` (or raised under `ErrorPolicy::Throw`)
    /// and yield `Ok(None)`; API warnings are appended to `log` and do not
    /// affect the result.
    pub fn parse_call(
        &self,
        method: &str,
        params: &Map<String, Value>,
        request: &HttpRequest,
        response: HttpResponse,
        log: &mut RequestLog,
    ) -> Result<Option<Value>> {
        let policy = self.config.error_policy;

        if !response.is_json() {
            error!(method, content_type = response.content_type(), "non-JSON response");
            log.record_error(policy, Some("response_info"), &describe_response(&response))?;
            return Ok(None);
        }

        if !response.is_success() {
            error!(method, status = response.status, "unexpected HTTP status");
            let data = serde_json::to_string_pretty(&self.outgoing_params(params))
                .map_err(|e| OrmError::Serialization(e.to_string()))?;
            let message = format!(
                "Error request method '{method}'\n\nURL:\n{}\n\nData:\n{data}\n\nResponse Info:\n{}",
                request.url,
                describe_response(&response)
            );
            log.record_error(policy, None, &message)?;
            return Ok(None);
        }

        let body: Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(e) => {
                error!(method, "response body is not valid JSON: {e}");
                log.record_error(policy, Some(method), &format!("invalid JSON: {e}"))?;
                return Ok(None);
            }
        };

        if let Some(message) = body.get("error").and_then(non_empty_str) {
            let code = match body.get("code") {
                Some(Value::String(code)) => code.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            error!(method, code = %code, "API error: {message}");
            log.record_error(policy, Some(method), &format!("{code}: {message}"))?;
            return Ok(None);
        }

        if let Some(Value::Array(warnings)) = body.get("warnings") {
            for item in warnings {
                let text = match item {
                    Value::String(text) => Some(text.as_str()),
                    other => other.get("warning").and_then(Value::as_str),
                };
                if let Some(text) = text {
                    warn!(method, "API warning: {text}");
                    log.record_warning(text);
                }
            }
        }

        Ok(match body.get("result") {
            None | Some(Value::Null) => None,
            Some(result) => Some(result.clone()),
        })
    }

    /// Call any vendor method by name.
    ///
    /// Transport failures are logged as `"{method}: {error}"` and retried up
    /// to `retry_count` attempts in total (at least one), unless a response
    /// arrived with an unreadable body. Every other failure ends the call
    /// immediately.
    pub fn call_raw(&self, method: &str, params: Map<String, Value>) -> Result<Response> {
        let mut log = RequestLog::default();
        let request = self.build_call(method, &params)?;
        let attempts = self.config.retry_count.max(1);

        for attempt in 1..=attempts {
            debug!(method, attempt, attempts, "calling API");
            match self.transport.send(&request) {
                Ok(response) => {
                    let result = self.parse_call(method, &params, &request, response, &mut log)?;
                    return Ok(Response { result, log });
                }
                Err(err) => {
                    warn!(method, attempt, "transport failure: {err}");
                    log.record_error(
                        self.config.error_policy,
                        None,
                        &format!("{method}: {err}"),
                    )?;
                    if !err.is_retryable() {
                        break;
                    }
                }
            }
        }

        Ok(Response { result: None, log })
    }

    pub fn call(&self, method: Method, params: Map<String, Value>) -> Result<Response> {
        self.call_raw(method.as_str(), params)
    }

    /// All campaign lists of the account.
    pub fn get_lists(&self) -> Result<Response> {
        self.call(Method::GetLists, Map::new())
    }

    pub fn create_list(
        &self,
        title: &str,
        before_subscribe_url: Option<&str>,
        after_subscribe_url: Option<&str>,
    ) -> Result<Response> {
        if title.is_empty() {
            return Err(OrmError::EmptyTitle);
        }
        let mut params = Map::new();
        params.insert("title".to_string(), json!(title));
        insert_non_empty(&mut params, "before_subscribe_url", before_subscribe_url);
        insert_non_empty(&mut params, "after_subscribe_url", after_subscribe_url);
        self.call(Method::CreateList, params)
    }

    pub fn update_list(
        &self,
        list_id: i64,
        title: &str,
        before_subscribe_url: Option<&str>,
        after_subscribe_url: Option<&str>,
    ) -> Result<Response> {
        if list_id < 1 {
            return Err(OrmError::InvalidListId(list_id));
        }
        if title.is_empty() {
            return Err(OrmError::EmptyTitle);
        }
        let mut params = Map::new();
        params.insert("list_id".to_string(), json!(list_id));
        params.insert("title".to_string(), json!(title));
        insert_non_empty(&mut params, "before_subscribe_url", before_subscribe_url);
        insert_non_empty(&mut params, "after_subscribe_url", after_subscribe_url);
        self.call(Method::UpdateList, params)
    }

    pub fn delete_list(&self, list_id: i64) -> Result<Response> {
        if list_id < 1 {
            return Err(OrmError::InvalidListId(list_id));
        }
        let mut params = Map::new();
        params.insert("list_id".to_string(), json!(list_id));
        self.call(Method::DeleteList, params)
    }
}

fn insert_non_empty(params: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        params.insert(key.to_string(), json!(value));
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn describe_response(response: &HttpResponse) -> String {
    let headers: Vec<String> = response
        .headers
        .iter()
        .map(|(name, value)| format!("  {name}: {value}"))
        .collect();
    format!(
        "status: {}\ncontent_type: {}\nheaders:\n{}",
        response.status,
        response.content_type(),
        headers.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErrorPolicy;
    use crate::error::TransportError;
    use crate::testing::{json_response, ScriptedTransport};

    fn config() -> ClientConfig {
        ClientConfig::new("k").with_api_host("http://localhost:3000/en/api/")
    }

    fn client(transport: &ScriptedTransport) -> Client {
        Client::new(config(), transport.clone())
    }

    fn body_pairs(request: &HttpRequest) -> Vec<(String, String)> {
        url::form_urlencoded::parse(&request.body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn build_call_targets_method_url() {
        let transport = ScriptedTransport::new();
        let req = client(&transport).build_call("getLists", &Map::new()).unwrap();
        assert_eq!(req.url, "http://localhost:3000/en/api/getLists?format=json");
        assert_eq!(
            req.headers,
            vec![(
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string()
            )]
        );
        assert_eq!(body_pairs(&req), vec![("api_key".to_string(), "k".to_string())]);
    }

    #[test]
    fn build_call_injects_platform() {
        let client = Client::new(config().with_platform("shop"), ScriptedTransport::new());
        let req = client.build_call("getLists", &Map::new()).unwrap();
        let pairs = body_pairs(&req);
        assert!(pairs.contains(&("platform".to_string(), "shop".to_string())));
        assert!(pairs.contains(&("api_key".to_string(), "k".to_string())));
    }

    #[cfg(feature = "compression")]
    #[test]
    fn build_call_compresses_when_enabled() {
        use std::io::Read;

        let client = Client::new(config().with_compression(true), ScriptedTransport::new());
        let req = client.build_call("getLists", &Map::new()).unwrap();
        assert!(req.url.ends_with("getLists?format=json&request_compression=bzip2"));

        let mut decoder = bzip2::read::BzDecoder::new(&req.body[..]);
        let mut body = String::new();
        decoder.read_to_string(&mut body).unwrap();
        assert_eq!(body, "api_key=k");
    }

    #[test]
    fn call_returns_result() {
        let transport = ScriptedTransport::new();
        transport.push_response(json_response(200, r#"{"result":[{"id":"1","title":"A"}]}"#));
        let response = client(&transport).get_lists().unwrap();
        assert_eq!(response.result, Some(json!([{"id": "1", "title": "A"}])));
        assert!(response.log.check(true).is_ok());
    }

    #[test]
    fn null_result_is_none() {
        let transport = ScriptedTransport::new();
        transport.push_response(json_response(200, r#"{"result":null}"#));
        let response = client(&transport).get_lists().unwrap();
        assert_eq!(response.result, None);
        assert!(!response.log.has_errors());
    }

    #[test]
    fn warnings_are_logged_but_call_succeeds() {
        let transport = ScriptedTransport::new();
        transport.push_response(json_response(
            200,
            r#"{"result":{"id":"5"},"warnings":[{"warning":"w1"}]}"#,
        ));
        let response = client(&transport).create_list("A", None, None).unwrap();
        assert_eq!(response.result, Some(json!({"id": "5"})));
        assert_eq!(response.log.warnings(), ["w1".to_string()]);
        assert!(!response.log.has_errors());
    }

    #[test]
    fn api_error_is_keyed_by_method() {
        let transport = ScriptedTransport::new();
        transport.push_response(json_response(
            200,
            r#"{"error":"wrong key","code":"invalid_api_key"}"#,
        ));
        let response = client(&transport).get_lists().unwrap();
        assert_eq!(response.result, None);
        assert_eq!(response.log.error("getLists"), Some("invalid_api_key: wrong key"));
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn non_json_response_is_not_retried() {
        let transport = ScriptedTransport::new();
        transport.push_response(HttpResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: "<html></html>".to_string(),
        });
        let response = client(&transport).get_lists().unwrap();
        assert_eq!(response.result, None);
        assert!(response.log.error("response_info").is_some());
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn bad_status_logs_request_details() {
        let transport = ScriptedTransport::new();
        transport.push_response(json_response(500, r#"{"result":null}"#));
        let mut params = Map::new();
        params.insert("list_id".to_string(), json!(3));
        let response = client(&transport).call(Method::DeleteList, params).unwrap();
        assert_eq!(response.result, None);
        let entry = &response.log.errors()[0];
        assert_eq!(entry.key, None);
        assert!(entry.message.contains("Error request method 'deleteList'"));
        assert!(entry.message.contains("\"list_id\": 3"));
        assert!(entry.message.contains("status: 500"));
        assert!(!entry.message.contains("api_key"));
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn transient_failures_are_retried() {
        let transport = ScriptedTransport::new();
        transport.push_failure(TransportError::Timeout);
        transport.push_failure(TransportError::Connection("refused".to_string()));
        transport.push_failure(TransportError::Timeout);
        transport.push_response(json_response(200, r#"{"result":[]}"#));

        let response = client(&transport).get_lists().unwrap();
        assert_eq!(response.result, Some(json!([])));
        assert_eq!(response.log.errors().len(), 3);
        assert_eq!(response.log.errors()[0].message, "getLists: operation timed out");
        assert_eq!(transport.sent().len(), 4);
    }

    #[test]
    fn retries_stop_after_retry_count() {
        let transport = ScriptedTransport::new();
        for _ in 0..10 {
            transport.push_failure(TransportError::Timeout);
        }
        let client = Client::new(config().with_retry_count(3), transport.clone());
        let response = client.get_lists().unwrap();
        assert_eq!(response.result, None);
        assert_eq!(response.log.errors().len(), 3);
        assert_eq!(transport.sent().len(), 3);
    }

    #[test]
    fn unreadable_body_is_not_retried() {
        let transport = ScriptedTransport::new();
        transport.push_failure(TransportError::Body("body exceeds limit".to_string()));
        transport.push_response(json_response(200, r#"{"result":[]}"#));

        let response = client(&transport).create_list("A", None, None).unwrap();
        assert_eq!(response.result, None);
        assert_eq!(response.log.errors().len(), 1);
        assert!(response.log.errors()[0].message.starts_with("createList: unreadable response body"));
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn oversized_body_over_http_is_sent_once() {
        use std::sync::atomic::Ordering;

        let (addr, hits) = crate::testing::serve_oversized_body();
        let client = Client::with_ureq(
            ClientConfig::new("k")
                .with_api_host(&format!("http://{addr}/en/api/"))
                .with_timeout_secs(5),
        );
        let response = client.get_lists().unwrap();
        assert_eq!(response.result, None);
        assert_eq!(response.log.errors().len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_retry_count_still_attempts_once() {
        let transport = ScriptedTransport::new();
        transport.push_failure(TransportError::Timeout);
        let client = Client::new(config().with_retry_count(0), transport.clone());
        let response = client.get_lists().unwrap();
        assert_eq!(response.log.errors().len(), 1);
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn throw_policy_raises_on_first_transport_failure() {
        let transport = ScriptedTransport::new();
        transport.push_failure(TransportError::Timeout);
        transport.push_response(json_response(200, r#"{"result":[]}"#));
        let client = Client::new(
            config().with_error_policy(ErrorPolicy::Throw),
            transport.clone(),
        );
        let err = client.get_lists().unwrap_err();
        assert_eq!(err.to_string(), "getLists: operation timed out");
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn throw_policy_raises_api_errors() {
        let transport = ScriptedTransport::new();
        transport.push_response(json_response(200, r#"{"error":"nope","code":"x"}"#));
        let client = Client::new(
            config().with_error_policy(ErrorPolicy::Throw),
            transport.clone(),
        );
        let err = client.get_lists().unwrap_err();
        assert!(matches!(err, OrmError::Request(ref msg) if msg == "getLists: x: nope"));
    }

    #[test]
    fn create_list_rejects_empty_title_without_request() {
        let transport = ScriptedTransport::new();
        let err = client(&transport).create_list("", None, None).unwrap_err();
        assert!(matches!(err, OrmError::EmptyTitle));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn update_list_drops_empty_urls() {
        let transport = ScriptedTransport::new();
        transport.push_response(json_response(200, r#"{"result":{}}"#));
        client(&transport)
            .update_list(9, "T", Some(""), Some("https://example.com/after"))
            .unwrap();
        let pairs = body_pairs(&transport.sent()[0]);
        assert!(pairs.contains(&("list_id".to_string(), "9".to_string())));
        assert!(pairs.contains(&(
            "after_subscribe_url".to_string(),
            "https://example.com/after".to_string()
        )));
        assert!(!pairs.iter().any(|(k, _)| k == "before_subscribe_url"));
    }

    #[test]
    fn list_operations_reject_invalid_ids() {
        let transport = ScriptedTransport::new();
        let client = client(&transport);
        assert!(matches!(client.delete_list(0), Err(OrmError::InvalidListId(0))));
        assert!(matches!(
            client.update_list(-1, "T", None, None),
            Err(OrmError::InvalidListId(-1))
        ));
    }
}
