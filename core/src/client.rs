//! Bulletin API client.
//!
//! # Design
//! `BulletinClient` holds only immutable configuration. Every operation is
//! split into a `build_*` method that produces an `HttpRequest` and the
//! shared `parse_response` classifier; the public operations glue the two
//! together through a `Transport`, executing the request exactly once.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, TransportError};
use crate::form::{self, FormData};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

pub const TOKEN_HEADER: &str = "X-API-Token";

/// Synchronous client for the Bulletin API.
#[derive(Clone)]
pub struct BulletinClient<T = UreqTransport> {
    token: String,
    config: ClientConfig,
    transport: T,
}

impl BulletinClient<UreqTransport> {
    /// Client for the production endpoint. The token is not validated here;
    /// a bad token surfaces as a 401/403 on the first call.
    pub fn new(token: &str) -> Self {
        Self::with_config(token, ClientConfig::default())
    }

    pub fn with_config(token: &str, config: ClientConfig) -> Self {
        Self::with_transport(token, config, UreqTransport)
    }
}

impl<T: Transport> BulletinClient<T> {
    pub fn with_transport(token: &str, config: ClientConfig, transport: T) -> Self {
        debug!(
            "creating Bulletin client for {} with token {}",
            config.endpoint(),
            mask(token)
        );
        Self {
            token: token.to_string(),
            config,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch all lists. The payload is passed through undecoded beyond JSON.
    pub fn get_lists(&self) -> Result<Value, ApiError> {
        self.request(self.build_get_lists())
    }

    /// Subscribe a person to `list_id`.
    ///
    /// `list_id` is placed in the path as given; it must not contain `/`.
    pub fn subscribe(&self, list_id: &str, data: &FormData) -> Result<Value, ApiError> {
        self.request(self.build_subscribe(list_id, data))
    }

    pub fn build_get_lists(&self) -> HttpRequest {
        self.build(HttpMethod::Get, "lists", None)
    }

    pub fn build_subscribe(&self, list_id: &str, data: &FormData) -> HttpRequest {
        let path = format!("lists/{list_id}/subscribers");
        self.build(HttpMethod::Post, &path, Some(form::encode(data)))
    }

    /// Classify the outcome of a single request.
    pub fn parse_response(
        &self,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<Value, ApiError> {
        classify(outcome)
    }

    fn build(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        let mut headers = vec![(TOKEN_HEADER.to_string(), self.token.clone())];
        if body.is_some() {
            headers.push(("content-type".to_string(), form::CONTENT_TYPE.to_string()));
        }
        HttpRequest {
            method,
            url: format!("{}{}", self.config.endpoint(), path),
            headers,
            body,
        }
    }

    fn request(&self, request: HttpRequest) -> Result<Value, ApiError> {
        debug!("{} {}", request.method.as_str(), request.url);
        let outcome = self.transport.execute(&request, &self.config);
        if let Ok(ref response) = outcome {
            debug!("{} {} -> {}", request.method.as_str(), request.url, response.status);
        }
        self.parse_response(outcome)
    }
}

impl<T> std::fmt::Debug for BulletinClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulletinClient")
            .field("endpoint", &self.config.endpoint())
            .field("token", &mask(&self.token))
            .finish()
    }
}

/// Map a transport outcome onto the payload or an `ApiError`.
fn classify(outcome: Result<HttpResponse, TransportError>) -> Result<Value, ApiError> {
    let response = outcome?;
    match response.status {
        200 => Ok(serde_json::from_str(&response.body).unwrap_or_else(|e| {
            warn!("200 response with undecodable body: {e}");
            Value::Null
        })),
        401 => Err(ApiError::TokenMissing),
        403 => Err(ApiError::TokenInvalid),
        status => {
            let reported = serde_json::from_str::<Value>(&response.body)
                .ok()
                .and_then(|body| match body {
                    Value::Object(mut fields) => fields.remove("error"),
                    _ => None,
                });
            Err(match reported {
                Some(error) => ApiError::Server {
                    status,
                    message: render(error),
                },
                None => ApiError::Communication { status },
            })
        }
    }
}

/// Text form of a server-reported `error` value.
fn render(error: Value) -> String {
    match error {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Keep the first and last four characters of a secret for log lines.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::error::TransportErrorKind;

    /// Returns a canned outcome and records every request it receives.
    struct CannedTransport {
        outcome: Result<HttpResponse, TransportError>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl CannedTransport {
        fn new(outcome: Result<HttpResponse, TransportError>) -> Self {
            Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for CannedTransport {
        fn execute(
            &self,
            request: &HttpRequest,
            _config: &ClientConfig,
        ) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.outcome.clone()
        }
    }

    fn client() -> BulletinClient {
        BulletinClient::new("secret-token-1234")
    }

    fn canned(status: u16, body: &str) -> BulletinClient<CannedTransport> {
        BulletinClient::with_transport(
            "secret-token-1234",
            ClientConfig::default(),
            CannedTransport::new(Ok(HttpResponse::new(status, body))),
        )
    }

    fn data(value: Value) -> FormData {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn build_get_lists_produces_correct_request() {
        let req = client().build_get_lists();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://www.bulletin.email/api/lists");
        assert_eq!(req.header("x-api-token"), Some("secret-token-1234"));
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn build_subscribe_produces_form_post() {
        let req = client().build_subscribe("abc123", &data(json!({ "email": "a@b.com" })));
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://www.bulletin.email/api/lists/abc123/subscribers");
        assert_eq!(req.header("X-API-Token"), Some("secret-token-1234"));
        assert_eq!(req.header("Content-Type"), Some("application/x-www-form-urlencoded"));
        assert_eq!(req.body.as_deref(), Some("email=a%40b.com"));
    }

    #[test]
    fn list_id_is_not_escaped() {
        let req = client().build_subscribe("a b/c", &FormData::new());
        assert_eq!(req.url, "https://www.bulletin.email/api/lists/a b/c/subscribers");
    }

    #[test]
    fn custom_endpoint_is_used() {
        let config = ClientConfig::default().with_endpoint("http://localhost:3000/api");
        let req = BulletinClient::with_config("t", config).build_get_lists();
        assert_eq!(req.url, "http://localhost:3000/api/lists");
    }

    #[test]
    fn ok_returns_payload_unchanged() {
        let lists = json!([{ "id": "l1", "name": "Newsletter" }, { "id": "l2", "name": "Promo" }]);
        let result = canned(200, &lists.to_string()).get_lists().unwrap();
        assert_eq!(result, lists);
    }

    #[test]
    fn ok_with_bad_json_yields_null() {
        let result = canned(200, "<html>oops</html>").get_lists().unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn unauthorized_ignores_body() {
        let err = canned(401, r#"{"error":"whatever"}"#).get_lists().unwrap_err();
        assert_eq!(err, ApiError::TokenMissing);
        assert_eq!(err.to_string(), "API token not submitted");
        assert_eq!(err.code(), 401);
    }

    #[test]
    fn forbidden_is_invalid_token() {
        let err = canned(403, "").subscribe("l1", &FormData::new()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid API token used");
        assert_eq!(err.code(), 403);
    }

    #[test]
    fn server_error_field_becomes_message() {
        let err = canned(500, r#"{"error":"Something broke"}"#).get_lists().unwrap_err();
        assert_eq!(err.to_string(), "Something broke");
        assert_eq!(err.code(), 500);
    }

    #[test]
    fn non_string_error_field_is_rendered_as_json() {
        let err = canned(422, r#"{"error":{"email":["is invalid"]}}"#)
            .get_lists()
            .unwrap_err();
        assert_eq!(err.to_string(), r#"{"email":["is invalid"]}"#);
        assert_eq!(err.code(), 422);
    }

    #[test]
    fn non_json_error_body_is_generic_failure() {
        let err = canned(500, "Internal Server Error").get_lists().unwrap_err();
        assert_eq!(err, ApiError::Communication { status: 500 });
        assert_eq!(err.to_string(), "Communication with Bulletin failed");
    }

    #[test]
    fn json_array_error_body_is_generic_failure() {
        let err = canned(500, r#"["error"]"#).get_lists().unwrap_err();
        assert_eq!(err.code(), 500);
        assert_eq!(err.to_string(), "Communication with Bulletin failed");
    }

    #[test]
    fn object_without_error_field_is_generic_failure() {
        let err = canned(404, r#"{"message":"nope"}"#).get_lists().unwrap_err();
        assert_eq!(err, ApiError::Communication { status: 404 });
    }

    #[test]
    fn transport_failure_embeds_code_and_description() {
        let client = BulletinClient::with_transport(
            "t",
            ClientConfig::default(),
            CannedTransport::new(Err(TransportError::new(
                TransportErrorKind::Timeout,
                "timeout: connect",
            ))),
        );
        let err = client.get_lists().unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(err.code(), 0);
        let message = err.to_string();
        assert!(message.contains("[28]"), "{message}");
        assert!(message.contains("timeout: connect"), "{message}");
    }

    #[test]
    fn subscribe_sends_single_post() {
        let subscriber = json!({ "id": "s1", "email": "a@b.com" });
        let client = canned(200, &subscriber.to_string());
        let result = client
            .subscribe("abc123", &data(json!({ "email": "a@b.com" })))
            .unwrap();
        assert_eq!(result, subscriber);

        let seen = client.transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Post);
        assert!(seen[0].url.ends_with("/lists/abc123/subscribers"));
        assert_eq!(seen[0].body.as_deref(), Some("email=a%40b.com"));
    }

    #[test]
    fn repeated_calls_are_not_cached() {
        let client = canned(200, "[]");
        client.get_lists().unwrap();
        client.get_lists().unwrap();
        assert_eq!(client.transport.seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn debug_masks_token() {
        let rendered = format!("{:?}", client());
        assert!(!rendered.contains("secret-token-1234"));
        assert!(rendered.contains("secr...1234"));
    }

    #[test]
    fn short_tokens_are_fully_masked() {
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask(""), "");
    }
}
