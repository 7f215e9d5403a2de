//! Error types for the JSON fetcher.
//!
//! # Design
//! One variant per failure point of a fetch: transport, status code, body
//! read, and JSON parse. Deserialization failures are split by serde_json's
//! error category: bytes that are not JSON are `Parse`, while well-formed
//! JSON that the destination type rejects is `Mismatch`. Every variant
//! carries the requested URL so callers can log the error without threading
//! the URL through separately.

use serde_json::error::Category;
use thiserror::Error;

/// The failure point a `FetchError` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    HttpStatus,
    Io,
    Parse,
    Mismatch,
}

/// Errors returned by `JsonFetcher`.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or no response arrived (DNS, refused
    /// connection, timeout, TLS, malformed URL or header).
    #[error("request to {url} failed: {source}")]
    Network { url: String, source: ureq::Error },

    /// The server answered with something other than 200.
    #[error("the request to {url} returned with a non-200, {status}")]
    HttpStatus { url: String, status: u16 },

    /// Headers arrived but the body could not be read to the end.
    #[error("reading the response body from {url} failed: {source}")]
    Io { url: String, source: ureq::Error },

    /// The body is not well-formed JSON.
    #[error("response body from {url} is not valid JSON: {source}")]
    Parse {
        url: String,
        source: serde_json::Error,
    },

    /// The body is well-formed JSON but the destination type rejected it: a
    /// value of the wrong type, or a required field missing because the type
    /// is not `#[serde(default)]`.
    #[error("response body from {url} does not match the destination type: {source}")]
    Mismatch {
        url: String,
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Wrap a deserialization error for the body fetched from `url`.
    pub fn from_json(url: &str, source: serde_json::Error) -> Self {
        let url = url.to_string();
        match source.classify() {
            Category::Data => FetchError::Mismatch { url, source },
            Category::Syntax | Category::Eof | Category::Io => FetchError::Parse { url, source },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Network { .. } => ErrorKind::Network,
            FetchError::HttpStatus { .. } => ErrorKind::HttpStatus,
            FetchError::Io { .. } => ErrorKind::Io,
            FetchError::Parse { .. } => ErrorKind::Parse,
            FetchError::Mismatch { .. } => ErrorKind::Mismatch,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Network { url, .. }
            | FetchError::HttpStatus { url, .. }
            | FetchError::Io { url, .. }
            | FetchError::Parse { url, .. }
            | FetchError::Mismatch { url, .. } => url,
        }
    }

    /// Whether repeating the same request may succeed. A non-200 status is
    /// left to the caller, who knows what the code means for their API.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Io)
    }

    /// The status code for `HttpStatus` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
