//! Fetcher configuration.

use std::time::Duration;

/// Timeout applied to a whole request when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings fixed when a `JsonFetcher` is constructed.
///
/// `Default` reproduces the stock behavior: a 10 second timeout covering
/// connect, request, and body read, no extra headers, and no cap on the body
/// size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    pub timeout: Duration,
    /// Sent with every request unless the caller supplies a header with the
    /// same name.
    pub default_headers: Vec<(String, String)>,
    /// Largest body in bytes that will be read; `None` reads any size.
    pub max_body_size: Option<u64>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            default_headers: Vec::new(),
            max_body_size: None,
        }
    }
}

impl FetcherConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_body_size(mut self, bytes: u64) -> Self {
        self.max_body_size = Some(bytes);
        self
    }

    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .push((name.to_string(), value.to_string()));
        self
    }
}
