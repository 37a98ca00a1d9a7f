pub mod auth;
mod blogs;
pub mod chat;
pub mod error;
mod inbox;
pub mod metrics;
mod pricing;
mod projects;
pub mod rate_limit;
mod settings;
mod upload;
pub mod validation;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::AppState;

/// The whole HTTP surface: JSON API, uploads, public site and dashboard
pub fn create_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/projects", get(projects::list_projects))
        .route("/projects/:slug", get(projects::get_project))
        .route("/blogs", get(blogs::list_blogs))
        .route("/blogs/:slug", get(blogs::get_blog))
        .route("/pricing", get(pricing::list_plans))
        .route("/settings", get(settings::get_settings))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_api,
        ))
        // Published content can be read from any origin
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        );

    let form_routes = Router::new()
        .route("/orders", post(inbox::create_order))
        .route("/contact", post(inbox::submit_contact))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_forms,
        ));

    let chat_routes = Router::new()
        .route("/chat", post(chat::chat))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_chat,
        ));

    // Multipart bodies carry some framing on top of the file itself
    let upload_limit = state.config.uploads.max_bytes.saturating_add(64 * 1024);
    let upload_routes = Router::new()
        .route("/upload", post(upload::upload))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::admin_middleware,
        ));

    let admin_routes = Router::new()
        .route(
            "/projects",
            get(projects::list_all_projects).post(projects::create_project),
        )
        .route(
            "/projects/:id",
            put(projects::update_project).delete(projects::delete_project),
        )
        .route("/blogs", post(blogs::create_blog))
        .route("/blogs/:id", put(blogs::update_blog).delete(blogs::delete_blog))
        .route("/pricing", post(pricing::create_plan))
        .route(
            "/pricing/:id",
            put(pricing::update_plan).delete(pricing::delete_plan),
        )
        .route("/orders", get(inbox::list_orders))
        .route("/orders/:id/status", put(inbox::update_order_status))
        .route("/messages", get(inbox::list_messages))
        .route("/messages/:id/status", put(inbox::update_message_status))
        .route("/settings", put(settings::update_settings))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::admin_middleware,
        ));

    let api_routes = public_routes
        .merge(form_routes)
        .merge(chat_routes)
        .merge(upload_routes)
        .nest("/admin", admin_routes);

    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.server.uploads_dir))
        .merge(crate::ui::create_router(state.clone()));

    if state.config.metrics.enabled {
        router = router
            .route("/metrics", get(metrics::metrics_endpoint))
            .layer(middleware::from_fn(metrics::metrics_middleware));
    }

    router
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::{test_state, test_state_with};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const TOKEN: &str = "test-admin-token";

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(test_state().await);
        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_public_api_allows_cross_origin_reads() {
        let app = create_router(test_state().await);
        let request = Request::builder()
            .uri("/api/pricing")
            .header(header::ORIGIN, "https://partner.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_admin_routes_require_token() {
        let app = create_router(test_state().await);
        let (status, body) = send(&app, get_request("/api/admin/orders")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "unauthorized");

        let (status, _) = send(
            &app,
            json_request("POST", "/api/admin/blogs", json!({ "title": "x" }), Some("wrong")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_public_projects_only_show_published() {
        let app = create_router(test_state().await);

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/admin/projects",
                json!({
                    "title": "Launch Film",
                    "category": "visual-storytelling",
                    "status": "published",
                    "videoUrl": "https://video.example/launch",
                    "aiModels": ["ignored"]
                }),
                Some(TOKEN),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["project"]["slug"], "launch-film");
        assert!(body["project"].get("aiModels").is_none());

        send(
            &app,
            json_request(
                "POST",
                "/api/admin/projects",
                json!({ "title": "Secret Draft", "category": "creative-studio" }),
                Some(TOKEN),
            ),
        )
        .await;

        let (status, body) = send(&app, get_request("/api/projects")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["projects"].as_array().unwrap().len(), 1);

        let (status, _) = send(&app, get_request("/api/projects/secret-draft")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) = send(&app, get_request("/api/projects/launch-film")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["project"]["videoUrl"], "https://video.example/launch");

        let (_, body) = send(&app, get_request("/api/projects?category=creative-studio")).await;
        assert!(body["projects"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_category_filter_accepts_aliases() {
        let app = create_router(test_state().await);
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/admin/projects",
                json!({ "title": "Old Storefront", "category": "web-dev", "status": "published" }),
                Some(TOKEN),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        for query in ["web-dev", "web-development"] {
            let (_, body) = send(&app, get_request(&format!("/api/projects?category={}", query))).await;
            let projects = body["projects"].as_array().unwrap();
            assert_eq!(projects.len(), 1, "category={}", query);
            assert_eq!(projects[0]["category"], "web-development");
        }
    }

    #[tokio::test]
    async fn test_project_validation_errors_have_field_details() {
        let app = create_router(test_state().await);
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/admin/projects",
                json!({ "title": "Bad", "category": "digital-development", "features": "x" }),
                Some(TOKEN),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
        assert!(body["error"]["details"]["details"].is_array());
    }

    #[tokio::test]
    async fn test_missing_blog_slug() {
        let app = create_router(test_state().await);
        let (status, body) = send(&app, get_request("/api/blogs/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "error": "Blog not found" }));
    }

    #[tokio::test]
    async fn test_pricing_is_sorted_and_order_is_created() {
        let app = create_router(test_state().await);
        let (status, body) = send(&app, get_request("/api/pricing")).await;
        assert_eq!(status, StatusCode::OK);
        let plans = body["plans"].as_array().unwrap();
        let names: Vec<&str> = plans.iter().filter_map(|p| p["name"].as_str()).collect();
        assert_eq!(names, vec!["Starter", "Growth", "Custom"]);

        let starter = &plans[0];
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/orders",
                json!({
                    "name": "Ama",
                    "email": "ama@example.com",
                    "phone": "",
                    "message": "Let's talk",
                    "planId": starter["_id"],
                    "plan": starter["name"],
                    "price": starter["price"],
                    "currency": starter["currency"]
                }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["order"]["planId"], starter["_id"]);
        assert_eq!(body["order"]["status"], "pending");

        let (status, body) = send(&app, {
            let mut request = get_request("/api/admin/orders");
            request
                .headers_mut()
                .insert(header::COOKIE, format!("atelier_session={}", TOKEN).parse().unwrap());
            request
        })
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["orders"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_contact_honeypot_is_rejected() {
        let app = create_router(test_state().await);
        let contact = json!({
            "name": "Bot",
            "email": "bot@example.com",
            "phone": "",
            "message": "Buy now",
            "website_url": "http://spam.example"
        });
        let (status, _) = send(&app, json_request("POST", "/api/contact", contact, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let contact = json!({ "name": "Ama", "email": "ama@example.com", "message": "Hello" });
        let (status, body) = send(&app, json_request("POST", "/api/contact", contact, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_form_routes_are_rate_limited() {
        let mut config = Config::default();
        config.rate_limit.form_requests_per_window = 2;
        let app = create_router(test_state_with(config).await);

        let contact = json!({ "name": "Ama", "email": "ama@example.com", "message": "Hi" });
        for _ in 0..2 {
            let (status, _) =
                send(&app, json_request("POST", "/api/contact", contact.clone(), None)).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, body) =
            send(&app, json_request("POST", "/api/contact", contact, None)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "too_many_requests");

        let (status, _) = send(&app, get_request("/api/pricing")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chat_unconfigured_is_503() {
        let app = create_router(test_state().await);
        let (status, _) = send(
            &app,
            json_request("POST", "/api/chat", json!({ "message": "hi", "history": [] }), None),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_upload_stores_file_and_serves_it() {
        let uploads = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.uploads_dir = uploads.path().to_path_buf();
        let app = create_router(test_state_with(config).await);

        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"logo.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let url = body["url"].as_str().unwrap().to_string();
        assert!(url.starts_with("/uploads/") && url.ends_with(".png"));

        let response = app.clone().oneshot(get_request(&url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"PNGDATA");
    }

    #[tokio::test]
    async fn test_upload_rejects_disallowed_type() {
        let uploads = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.uploads_dir = uploads.path().to_path_buf();
        let app = create_router(test_state_with(config).await);

        let body = "--B\r\nContent-Disposition: form-data; name=\"file\"; filename=\"x.exe\"\r\n\r\nMZ\r\n--B--\r\n";
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=B")
            .body(Body::from(body))
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_settings_round_trip_through_admin_api() {
        let app = create_router(test_state().await);
        let mut settings = serde_json::to_value(crate::db::SiteSettings::default()).unwrap();
        settings["siteName"] = json!("Studio Nine");

        let (status, _) =
            send(&app, json_request("PUT", "/api/admin/settings", settings, Some(TOKEN))).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = send(&app, get_request("/api/settings")).await;
        assert_eq!(body["siteName"], "Studio Nine");
    }
}
