//! Client configuration.
//!
//! Values are fixed at construction. The defaults point at the production
//! Bulletin API with 3 second connect and total timeouts.

use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://www.bulletin.email/api/";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    endpoint: String,
    pub connect_timeout: Duration,
    /// Caps the whole call, connect included.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Use a different base URL. A trailing `/` is added when missing so
    /// operation paths can be appended directly.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        let mut endpoint = endpoint.to_string();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        self.endpoint = endpoint;
        self
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
