//! Synchronous client for the Bulletin email-marketing API.
//!
//! # Overview
//! Two operations: `get_lists` and `subscribe`. Both build an
//! `HttpRequest`, execute it once through a `Transport`, and classify the
//! outcome into a JSON payload or an `ApiError`.
//!
//! # Design
//! - `BulletinClient` is stateless; it holds the token and `ClientConfig`.
//! - Request building and response classification are pure and public, so
//!   callers with their own HTTP stack can skip `Transport` entirely.
//! - Payloads stay as `serde_json::Value`; the client does not validate
//!   their shape.

pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod transport;

pub use client::BulletinClient;
pub use config::ClientConfig;
pub use error::{ApiError, TransportError, TransportErrorKind};
pub use form::FormData;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
