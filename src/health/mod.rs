//! Liveness endpoint.
//!
//! A single route answering GET with `200 OK` in plain text. Load balancers
//! poll it; it goes away first when the server stops.

use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};

pub const CONTENT_TYPE_TEXT_PLAIN: &str = "text/plain;charset=UTF-8";

/// Router exposing the health check at `path`. A missing leading `/` is added.
pub fn router(path: &str) -> Router {
    Router::new().route(&route_path(path), any(handle_health_check))
}

fn route_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// GET gets the status text for 200. Other methods get nothing written.
pub async fn handle_health_check(method: Method) -> Response {
    if method != Method::GET {
        return ().into_response();
    }

    let body = StatusCode::OK.canonical_reason().unwrap_or_default();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE_TEXT_PLAIN)],
        body,
    )
        .into_response()
}
