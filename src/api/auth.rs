//! Admin gate: a single configured token, sent as a bearer token, an
//! `X-API-Key` header, or the dashboard session cookie.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::error::ApiError;
use crate::AppState;

/// Cookie holding the admin token after a dashboard login
pub const SESSION_COOKIE: &str = "atelier_session";

/// Constant-time comparison against the configured admin token
pub fn token_matches(state: &AppState, token: &str) -> bool {
    let expected = state.config.auth.admin_token.as_bytes();
    let provided = token.as_bytes();
    !expected.is_empty() && expected.len() == provided.len() && expected.ct_eq(provided).into()
}

/// Token presented by a request, header first, then cookie
fn presented_token(headers: &HeaderMap) -> Option<String> {
    if let Some(header) = headers.get("authorization").and_then(|h| h.to_str().ok()) {
        let token = header.strip_prefix("Bearer ").unwrap_or(header);
        return Some(token.trim().to_string());
    }
    if let Some(key) = headers.get("x-api-key").and_then(|h| h.to_str().ok()) {
        return Some(key.trim().to_string());
    }
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

pub async fn admin_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match presented_token(request.headers()) {
        Some(token) if token_matches(&state, &token) => next.run(request).await,
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Rejected admin request with invalid token");
            ApiError::unauthorized("Invalid admin token").into_response()
        }
        None => ApiError::unauthorized("Admin token required").into_response(),
    }
}
