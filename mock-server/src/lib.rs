use std::collections::BTreeMap;

use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

/// Body served by `/malformed`: the games payload missing its leading brace.
pub const MALFORMED_BODY: &str = r#""response":{"games":[{"appid":10,"playtime_forever":32}]}}"#;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Game {
    pub appid: u32,
    pub playtime_forever: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameList {
    pub games: Vec<Game>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OwnedGames {
    pub response: GameList,
}

pub fn app() -> Router {
    Router::new()
        .route("/games", get(owned_games))
        .route("/unexpected", get(unexpected))
        .route("/malformed", get(malformed))
        .route("/status/{code}", get(status))
        .route("/echo-headers", get(echo_headers))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn owned_games() -> impl IntoResponse {
    let body = OwnedGames {
        response: GameList {
            games: vec![Game {
                appid: 10,
                playtime_forever: 32,
            }],
        },
    };
    ([("x-fixture", "games")], Json(body))
}

async fn unexpected() -> impl IntoResponse {
    (
        [("x-fixture", "unexpected")],
        Json(json!({ "test": { "something": true } })),
    )
}

async fn malformed() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE.as_str(), "application/json"),
            ("x-fixture", "malformed"),
        ],
        MALFORMED_BODY,
    )
}

async fn status(Path(code): Path<u16>) -> Result<impl IntoResponse, StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((
        status,
        [("x-fixture", "status")],
        Json(json!({ "error": status.canonical_reason().unwrap_or("unknown") })),
    ))
}

async fn echo_headers(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    let echoed = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(echoed)
}
