//! Blocking HTTP GET that deserializes a JSON body into a caller's type.
//!
//! # Overview
//! `JsonFetcher` issues a GET with optional extra headers, requires a 200
//! status, reads the body, and deserializes it with serde. The headers of the
//! most recent response are kept for later inspection, and `fetch` also
//! returns them alongside the value.
//!
//! # Design
//! - `Fetcher` is the two-operation trait callers program against.
//! - A fetch is split into `build_request` (pure), `execute` (I/O), and
//!   `parse_response` (pure), so the I/O boundary is explicit.
//! - Each failure point has its own `FetchError` variant: transport, status
//!   code, body read, and JSON parse.
//! - A body whose keys do not overlap the destination type is not an error;
//!   the destination ends up at its default value.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;

pub use config::{FetcherConfig, DEFAULT_TIMEOUT};
pub use error::{ErrorKind, FetchError};
pub use fetcher::{parse_response, Fetched, Fetcher, JsonFetcher};
pub use http::{FetchRequest, Headers, HttpResponse, ResponseMeta};
