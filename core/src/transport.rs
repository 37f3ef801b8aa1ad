//! Network execution of `HttpRequest` values.
//!
//! `UreqTransport` builds a fresh agent for every call, so no connection
//! state outlives a request and concurrent calls never share a handle.
//! Redirects are never followed: the token header must not reach another
//! origin, and a 3xx is classified like any other status.

use tracing::error;

use crate::config::ClientConfig;
use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes a single HTTP request exactly once.
///
/// Implementations must return every HTTP status as `Ok`; only failures
/// that prevent reading a response are `Err`.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: &HttpRequest,
        config: &ClientConfig,
    ) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn execute(
        &self,
        request: &HttpRequest,
        config: &ClientConfig,
    ) -> Result<HttpResponse, TransportError> {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .timeout_connect(Some(config.connect_timeout))
            .timeout_global(Some(config.timeout))
            .build()
            .new_agent();

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => {
                let mut builder = agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            (HttpMethod::Post, body) => {
                let mut builder = agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send(body.unwrap_or("").as_bytes())
            }
        };

        let mut response = result.map_err(|e| {
            error!("{} {} failed: {}", request.method.as_str(), request.url, e);
            map_error(e)
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        // Bytes first: a body that is not UTF-8 still has a status to classify.
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| map_error(e).with_status(status))?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_error(err: ureq::Error) -> TransportError {
    let kind = match &err {
        ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
        ureq::Error::HostNotFound => TransportErrorKind::HostNotFound,
        ureq::Error::ConnectionFailed => TransportErrorKind::ConnectionFailed,
        ureq::Error::Io(io) => match io.kind() {
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted => TransportErrorKind::ConnectionFailed,
            std::io::ErrorKind::TimedOut => TransportErrorKind::Timeout,
            _ => TransportErrorKind::Io,
        },
        ureq::Error::Tls(_) | ureq::Error::Rustls(_) => TransportErrorKind::Tls,
        _ => TransportErrorKind::Other,
    };
    TransportError::new(kind, err.to_string())
}
