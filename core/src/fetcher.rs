//! Blocking GET + status check + JSON deserialization.
//!
//! # Design
//! A fetch runs in three steps: `build_request` produces a `FetchRequest`,
//! `execute` performs the round trip, rejects non-200 statuses, and reads
//! the body, and `parse_response` checks the status and deserializes. Only `execute`
//! does I/O; the other two are pure and tested without a server.
//!
//! The agent is built in the constructor and reused for every call, so the
//! first `get` costs no more than later ones and keep-alive connections are
//! shared. `get` and `fetch` take `&mut self` because they overwrite the
//! retained last response; the borrow checker therefore forbids two calls
//! racing on one instance. Separate instances share nothing.

use std::fmt;

use log::debug;
use serde::de::DeserializeOwned;
use ureq::Agent;

use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::http::{headers_from_map, FetchRequest, Headers, HttpResponse, ResponseMeta};

/// Something that fetches JSON from a URL into a caller-owned destination.
///
/// Implemented by `JsonFetcher`; tests and caching layers can provide their
/// own implementation and be passed wherever a `Fetcher` is expected.
pub trait Fetcher {
    /// GET `url` with the optional extra `headers` and deserialize a 200
    /// response body into `destination`.
    ///
    /// `destination` is only written on success. JSON keys the destination
    /// type does not declare are ignored. Fields absent from the body keep
    /// their default values only if the type is `#[serde(default)]`; without
    /// it a body of a different shape fails with `FetchError::Mismatch`
    /// instead of leaving the destination at its default.
    fn get<T: DeserializeOwned>(
        &mut self,
        url: &str,
        headers: Option<&Headers>,
        destination: &mut T,
    ) -> Result<(), FetchError>;

    /// Headers of the most recently completed call, or `None` if no call
    /// has received a response yet. The map is a copy.
    fn last_response_headers(&self) -> Option<Headers>;
}

/// A deserialized body together with the response that carried it.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: T,
    pub status: u16,
    pub headers: Headers,
}

/// `Fetcher` backed by a blocking `ureq` agent.
pub struct JsonFetcher {
    agent: Agent,
    config: FetcherConfig,
    last_response: Option<ResponseMeta>,
}

impl fmt::Debug for JsonFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonFetcher")
            .field("config", &self.config)
            .field("last_response", &self.last_response)
            .finish_non_exhaustive()
    }
}

impl Default for JsonFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonFetcher {
    pub fn new() -> Self {
        Self::with_config(FetcherConfig::default())
    }

    pub fn with_config(config: FetcherConfig) -> Self {
        // Status codes are interpreted by `parse_response`, not by ureq.
        let agent = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            config,
            last_response: None,
        }
    }

    /// The settings this fetcher was built with.
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Status and headers of the most recently completed call.
    pub fn last_response(&self) -> Option<&ResponseMeta> {
        self.last_response.as_ref()
    }

    /// Describe a GET for `url`: the configured default headers, with every
    /// caller-supplied header set on top of them.
    pub fn build_request(&self, url: &str, headers: Option<&Headers>) -> FetchRequest {
        let mut request = FetchRequest {
            url: url.to_string(),
            headers: Vec::new(),
        };
        for (name, value) in &self.config.default_headers {
            request.set_header(name, value);
        }
        if let Some(headers) = headers {
            for (name, value) in headers {
                request.set_header(name, value);
            }
        }
        request
    }

    /// Send `request`, require a 200 status, and read the whole body.
    ///
    /// As soon as a status line and headers arrive they replace the retained
    /// last response, whether or not the status is 200 or the body can then
    /// be read. A non-200 status is reported before any of the body is read.
    /// A transport failure leaves the previous last response in place.
    pub fn execute(&mut self, request: &FetchRequest) -> Result<HttpResponse, FetchError> {
        debug!(
            "GET {} (headers: {:?})",
            request.url,
            request.headers.iter().map(|(name, _)| name).collect::<Vec<_>>()
        );

        let mut builder = self.agent.get(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder.call().map_err(|source| FetchError::Network {
            url: request.url.clone(),
            source,
        })?;

        let meta = ResponseMeta {
            status: response.status().as_u16(),
            headers: headers_from_map(response.headers()),
        };
        debug!("{} responded with {}", request.url, meta.status);
        self.last_response = Some(meta.clone());

        // The body reader is dropped with `response` on every path out of
        // this function; a non-200 body is never read.
        check_status(&request.url, meta.status)?;

        let limit = self.config.max_body_size.unwrap_or(u64::MAX);
        let body = response
            .body_mut()
            .with_config()
            .limit(limit)
            .read_to_vec()
            .map_err(|source| FetchError::Io {
                url: request.url.clone(),
                source,
            })?;

        Ok(HttpResponse::new(meta, body))
    }

    /// Build, execute, and parse in one call, returning the value with the
    /// headers of the response that produced it.
    pub fn fetch<T: DeserializeOwned>(
        &mut self,
        url: &str,
        headers: Option<&Headers>,
    ) -> Result<Fetched<T>, FetchError> {
        let request = self.build_request(url, headers);
        let response = self.execute(&request)?;
        let value = parse_response(url, &response)?;
        Ok(Fetched {
            value,
            status: response.status,
            headers: response.headers,
        })
    }
}

impl Fetcher for JsonFetcher {
    fn get<T: DeserializeOwned>(
        &mut self,
        url: &str,
        headers: Option<&Headers>,
        destination: &mut T,
    ) -> Result<(), FetchError> {
        let fetched = self.fetch(url, headers)?;
        *destination = fetched.value;
        Ok(())
    }

    fn last_response_headers(&self) -> Option<Headers> {
        self.last_response.as_ref().map(|meta| meta.headers.clone())
    }
}

fn check_status(url: &str, status: u16) -> Result<(), FetchError> {
    if status == 200 {
        return Ok(());
    }
    Err(FetchError::HttpStatus {
        url: url.to_string(),
        status,
    })
}

/// Require a 200 status and deserialize the body of `response`.
///
/// Unknown JSON keys are ignored. Keys of `T` missing from the body are only
/// tolerated when `T` is `#[serde(default)]`; otherwise, like any value of
/// the wrong type, they fail with `FetchError::Mismatch`. Bytes that are not
/// JSON at all fail with `FetchError::Parse`.
pub fn parse_response<T: DeserializeOwned>(
    url: &str,
    response: &HttpResponse,
) -> Result<T, FetchError> {
    check_status(url, response.status)?;
    serde_json::from_slice(&response.body).map_err(|source| FetchError::from_json(url, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;
    use std::time::Duration;

    const URL: &str = "http://localhost:3000/games";

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct OwnedGames {
        response: GameList,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct GameList {
        games: Vec<Game>,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Game {
        #[serde(rename = "appid")]
        id: i64,
        name: String,
        playtime_forever: i64,
        #[serde(rename = "playtime_2weeks")]
        playtime_recent: i64,
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Headers::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn parse_matching_body() {
        let body = r#"{"response":{"games":[{"appid":10,"playtime_forever":32}]}}"#;
        let parsed: OwnedGames = parse_response(URL, &response(200, body)).unwrap();
        assert_eq!(parsed.response.games.len(), 1);
        let game = &parsed.response.games[0];
        assert_eq!(game.id, 10);
        assert_eq!(game.playtime_forever, 32);
        assert_eq!(game.name, "");
        assert_eq!(game.playtime_recent, 0);
    }

    #[test]
    fn parse_non_overlapping_body_yields_default() {
        let body = r#"{"test":{"something":true}}"#;
        let parsed: OwnedGames = parse_response(URL, &response(200, body)).unwrap();
        assert!(parsed.response.games.is_empty());
    }

    #[test]
    fn parse_non_200_is_status_error() {
        let err = parse_response::<OwnedGames>(URL, &response(500, "{}")).unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus { status: 500, .. }));
        assert_eq!(err.url(), URL);
    }

    #[test]
    fn parse_201_is_still_status_error() {
        let err = parse_response::<OwnedGames>(URL, &response(201, "{}")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HttpStatus);
    }

    #[test]
    fn parse_malformed_body() {
        let body = r#""response":{"games":[]}}"#;
        let err = parse_response::<OwnedGames>(URL, &response(200, body)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[derive(Debug, Deserialize)]
    struct StrictGames {
        #[allow(dead_code)]
        response: GameList,
    }

    #[test]
    fn parse_shape_mismatch_without_serde_default() {
        let body = r#"{"test":{"something":true}}"#;
        let err = parse_response::<StrictGames>(URL, &response(200, body)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mismatch);
        assert!(err.to_string().contains("does not match the destination type"));
    }

    #[test]
    fn parse_wrong_value_type_is_mismatch() {
        let body = r#"{"response":{"games":[{"appid":"ten"}]}}"#;
        let err = parse_response::<OwnedGames>(URL, &response(200, body)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mismatch);
    }

    #[test]
    fn parse_empty_body() {
        let err = parse_response::<OwnedGames>(URL, &response(200, "")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn build_request_without_headers() {
        let req = JsonFetcher::new().build_request(URL, None);
        assert_eq!(req.url, URL);
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_request_caller_headers_override_defaults() {
        let config = FetcherConfig::default()
            .with_default_header("User-Agent", "json-fetcher")
            .with_default_header("x-trace", "on");
        let fetcher = JsonFetcher::with_config(config);

        let mut headers = Headers::new();
        headers.insert("user-agent".to_string(), "custom".to_string());
        let req = fetcher.build_request(URL, Some(&headers));

        assert_eq!(req.headers.len(), 2);
        assert!(req
            .headers
            .contains(&("x-trace".to_string(), "on".to_string())));
        assert!(req
            .headers
            .contains(&("user-agent".to_string(), "custom".to_string())));
    }

    #[test]
    fn fetcher_keeps_its_config() {
        let config = FetcherConfig::default()
            .with_timeout(Duration::from_secs(3))
            .with_max_body_size(4096);
        let fetcher = JsonFetcher::with_config(config.clone());
        assert_eq!(fetcher.config(), &config);
        assert_eq!(JsonFetcher::new().config(), &FetcherConfig::default());
    }

    #[test]
    fn new_fetcher_has_no_last_response() {
        let fetcher = JsonFetcher::new();
        assert!(fetcher.last_response_headers().is_none());
        assert!(fetcher.last_response().is_none());
    }

    #[test]
    fn invalid_url_is_network_error() {
        let mut fetcher = JsonFetcher::new();
        let mut destination = OwnedGames::default();
        let err = fetcher
            .get("not a url", None, &mut destination)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(fetcher.last_response_headers().is_none());
        assert!(destination.response.games.is_empty());
    }
}
