//! Prometheus metrics: the `/metrics` endpoint and request tracking.

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

use crate::db::{Message, Project, ProjectStatus};
use crate::AppState;

pub const HTTP_REQUESTS_TOTAL: &str = "atelier_http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "atelier_http_request_duration_seconds";
pub const ORDERS_TOTAL: &str = "atelier_orders_total";
pub const MESSAGES_TOTAL: &str = "atelier_messages_total";
pub const CHAT_REQUESTS_TOTAL: &str = "atelier_chat_requests_total";
pub const UPLOADS_TOTAL: &str = "atelier_uploads_total";
pub const PROJECTS_PUBLISHED: &str = "atelier_projects_published";
pub const MESSAGES_UNREAD: &str = "atelier_messages_unread";

/// Install the Prometheus recorder. Call once at startup.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(HTTP_REQUESTS_TOTAL, "HTTP requests by method, route and status");
    describe_histogram!(HTTP_REQUEST_DURATION_SECONDS, "HTTP request duration in seconds");
    describe_counter!(ORDERS_TOTAL, "Orders placed from the pricing page");
    describe_counter!(MESSAGES_TOTAL, "Contact messages received");
    describe_counter!(CHAT_REQUESTS_TOTAL, "Chat proxy requests by outcome");
    describe_counter!(UPLOADS_TOTAL, "Files uploaded through the dashboard");
    describe_gauge!(PROJECTS_PUBLISHED, "Projects currently published");
    describe_gauge!(MESSAGES_UNREAD, "Contact messages not yet read");

    Ok(handle)
}

/// GET /metrics
pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> Response {
    let Some(handle) = state.metrics_handle.as_ref() else {
        return (StatusCode::NOT_FOUND, "Metrics are disabled").into_response();
    };

    if let Ok(count) = Project::count_by_status(&state.db, ProjectStatus::Published).await {
        gauge!(PROJECTS_PUBLISHED).set(count as f64);
    }
    if let Ok(count) = Message::count_unread(&state.db).await {
        gauge!(MESSAGES_UNREAD).set(count as f64);
    }

    (StatusCode::OK, handle.render()).into_response()
}

/// Count requests and time them per matched route
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path.clone(), "status" => status)
        .increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path)
        .record(start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        for name in [ORDERS_TOTAL, MESSAGES_TOTAL, CHAT_REQUESTS_TOTAL, UPLOADS_TOTAL, HTTP_REQUESTS_TOTAL] {
            assert!(name.starts_with("atelier_") && name.ends_with("_total"), "{}", name);
        }
        assert!(HTTP_REQUEST_DURATION_SECONDS.ends_with("_seconds"));
    }
}
