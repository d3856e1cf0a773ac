//! Mock movie API shared by the integration tests.
//!
//! Serves `/3/movie/{list}` on a random local port from a tokio runtime
//! running on its own thread, so the blocking client under test never runs
//! inside an async context. Behaviour is keyed on the requested page:
//!
//! - `418` answers with the teapot error body
//! - `498` answers 200 with a body that is not JSON
//! - `499` answers 502 with an HTML body
//! - anything outside `1..=500` answers 400 with `status_code` 22
//! - every other page answers with two movies named after the list

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tmdb_cli::ClientConfig;

pub const TOKEN: &str = "secret";

const LISTS: [&str; 4] = ["now_playing", "popular", "top_rated", "upcoming"];

/// Start the mock server and return its base URL.
pub fn spawn_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            axum::serve(listener, router()).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// A base URL nothing is listening on.
pub fn dead_host() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn config(host: &str) -> ClientConfig {
    ClientConfig {
        host: host.to_string(),
        token: TOKEN.to_string(),
        timeout: Duration::from_secs(10),
        debug: true,
    }
}

fn router() -> Router {
    Router::new().route("/3/movie/{list}", get(list_movies))
}

fn api_error(status: u16, code: i64, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap();
    (
        status,
        Json(json!({ "status_code": code, "status_message": message })),
    )
        .into_response()
}

async fn list_movies(
    Path(list): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if header("authorization") != Some("Bearer secret") {
        return api_error(
            401,
            7,
            "Invalid API key: You must be granted a valid key.",
        );
    }
    if header("accept") != Some("application/json") {
        return api_error(406, 0, "Only JSON is served.");
    }
    if !LISTS.contains(&list.as_str()) {
        return api_error(
            404,
            34,
            "The resource you requested could not be found.",
        );
    }
    if params.get("language").map(String::as_str) != Some("en") {
        return api_error(400, 5, "Invalid parameters: language must be en.");
    }

    let page = params.get("page").and_then(|p| p.parse::<i64>().ok());
    match page {
        Some(418) => api_error(418, 42, "Some public message."),
        Some(498) => (StatusCode::OK, "not json").into_response(),
        Some(499) => (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").into_response(),
        Some(page) if (1..=500).contains(&page) => Json(json!({
            "page": page,
            "results": [
                {
                    "title": format!("{list} #1"),
                    "overview": format!("page {page}"),
                    "release_date": "2024-01-01",
                    "popularity": 12.34,
                    "vote_count": 100
                },
                {
                    "title": format!("{list} #2"),
                    "overview": format!("page {page}"),
                    "release_date": "2024-02-02",
                    "popularity": 56.789,
                    "vote_count": 200
                }
            ],
            "total_pages": 500,
            "total_results": 10000
        }))
        .into_response(),
        _ => api_error(
            400,
            22,
            "Invalid page: Pages start at 1 and max at 500. They are expected to be an integer.",
        ),
    }
}
