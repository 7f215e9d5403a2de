//! HTTP request/response types for the fetcher.
//!
//! # Design
//! Requests and responses are described as plain data so the build and
//! parse steps of a fetch stay pure and testable without a server. Only
//! `JsonFetcher::execute` touches the network.

use std::collections::HashMap;

use ureq::http::HeaderMap;

/// Header name to value. Names coming back from a response are lowercase.
pub type Headers = HashMap<String, String>;

/// A GET request described as plain data.
///
/// Built by `JsonFetcher::build_request` and executed by
/// `JsonFetcher::execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    /// Set `name` to `value`, replacing any existing header with the same
    /// (case-insensitive) name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }
}

/// Status and headers of a received response. This is what a fetcher
/// retains as its "last response" once the body has been released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    pub status: u16,
    pub headers: Headers,
}

/// A fully read HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(meta: ResponseMeta, body: Vec<u8>) -> Self {
        Self {
            status: meta.status,
            headers: meta.headers,
            body,
        }
    }
}

/// Flatten a `HeaderMap` to the first value of every header name.
///
/// Values that are not valid UTF-8 are converted lossily.
pub fn headers_from_map(map: &HeaderMap) -> Headers {
    map.keys()
        .filter_map(|name| {
            map.get(name).map(|value| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
        })
        .collect()
}
