//! Error types for the Bulletin API client.
//!
//! # Design
//! Every failure is an `ApiError` carrying a message (its `Display`) and a
//! numeric code. Authentication failures get dedicated variants because
//! their messages are fixed. Server-reported errors keep the `error` field
//! of the response body. Anything else the server returns collapses into
//! `Communication`.

use std::fmt;

use thiserror::Error;

/// Errors returned by `BulletinClient` operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a usable HTTP response.
    #[error("Error during request. transport[{}]: {0}", .0.code())]
    Transport(#[from] TransportError),

    /// The server answered 401.
    #[error("API token not submitted")]
    TokenMissing,

    /// The server answered 403.
    #[error("Invalid API token used")]
    TokenInvalid,

    /// The server answered with a JSON object carrying an `error` field.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The server answered with a status and body we cannot interpret.
    #[error("Communication with Bulletin failed")]
    Communication { status: u16 },
}

impl ApiError {
    /// HTTP status associated with the failure. Transport failures report
    /// whatever status was observed, which is normally 0.
    pub fn code(&self) -> u16 {
        match self {
            ApiError::Transport(e) => e.status,
            ApiError::TokenMissing => 401,
            ApiError::TokenInvalid => 403,
            ApiError::Server { status, .. } | ApiError::Communication { status } => *status,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Broad category of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    HostNotFound,
    ConnectionFailed,
    Timeout,
    Tls,
    Io,
    Other,
}

impl TransportErrorKind {
    /// Stable numeric code, following the libcurl numbering for the same
    /// conditions so operators can search for it.
    pub fn code(&self) -> u32 {
        match self {
            TransportErrorKind::HostNotFound => 6,
            TransportErrorKind::ConnectionFailed => 7,
            TransportErrorKind::Timeout => 28,
            TransportErrorKind::Tls => 35,
            TransportErrorKind::Io => 56,
            TransportErrorKind::Other => 1,
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportErrorKind::HostNotFound => "host not found",
            TransportErrorKind::ConnectionFailed => "connection failed",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Tls => "tls failure",
            TransportErrorKind::Io => "i/o error",
            TransportErrorKind::Other => "transport error",
        };
        f.write_str(s)
    }
}

/// A failure raised by a `Transport` before a response could be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {description}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub description: String,
    /// HTTP status seen before the failure, 0 if none.
    pub status: u16,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            status: 0,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn code(&self) -> u32 {
        self.kind.code()
    }
}
