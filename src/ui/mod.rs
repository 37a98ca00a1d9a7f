// Server-rendered public site and dashboard
// Askama templates, plain HTML forms, no client-side scripting

mod dashboard;
mod showcase;
mod templates;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::actions;
use crate::api::error::{ApiError, ErrorCode};
use crate::api::rate_limit;
use crate::db::{Blog, Category, ContactInput, OrderInput, Project, ProjectFilter, SiteSettings};
use crate::AppState;

pub use showcase::Showcase;
pub use templates::*;

const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

// Helper to render templates and handle errors
fn render_template<T: Template>(template: T) -> Response {
    render_with_status(StatusCode::OK, template)
}

fn render_with_status<T: Template>(status: StatusCode, template: T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Template error: {}", e)).into_response()
        }
    }
}

fn message_page(site: Arc<SiteSettings>, status: StatusCode, heading: &str, message: &str) -> Response {
    render_with_status(
        status,
        MessagePageTemplate {
            site,
            heading: heading.to_string(),
            message: message.to_string(),
        },
    )
}

// Page data could not be loaded
fn load_failed(site: Arc<SiteSettings>, e: impl std::fmt::Display) -> Response {
    tracing::error!(error = %e, "Failed to load page data");
    message_page(
        site,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong",
        "We could not load this page. Please try again later.",
    )
}

/// Messages to show a visitor for a failed submission: the field messages of
/// a validation error, a generic line for anything else.
fn visible_errors(e: &ApiError) -> Vec<String> {
    if e.code() == ErrorCode::ValidationError {
        let mut fields: Vec<(String, Vec<String>)> = e.field_errors().into_iter().collect();
        fields.sort();
        let messages: Vec<String> = fields.into_iter().flat_map(|(_, m)| m).collect();
        if !messages.is_empty() {
            return messages;
        }
    }
    vec![GENERIC_ERROR.to_string()]
}

pub fn create_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let form_posts = Router::new()
        .route("/contact", post(contact_submit))
        .route("/pricing", post(order_submit))
        .route_layer(middleware::from_fn_with_state(
            state,
            rate_limit::rate_limit_forms,
        ));

    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/works", get(works))
        .route("/works/:slug", get(work_detail))
        .route("/blog", get(blog_list))
        .route("/blog/:slug", get(blog_detail))
        .route("/pricing", get(pricing_page))
        .route("/contact", get(contact_page))
        .merge(form_posts)
        .nest("/dashboard", dashboard::router())
        .fallback(not_found)
}

async fn not_found(State(state): State<Arc<AppState>>) -> Response {
    message_page(
        state.settings(),
        StatusCode::NOT_FOUND,
        "Page not found",
        "The page you are looking for does not exist.",
    )
}

fn category_links(active: Option<&str>) -> Vec<CategoryLink> {
    Category::CURRENT
        .iter()
        .map(|c| CategoryLink {
            value: c.as_str().to_string(),
            label: c.label().to_string(),
            active: active == Some(c.as_str()),
        })
        .collect()
}

// Home: featured work and the latest posts
async fn home(State(state): State<Arc<AppState>>) -> Response {
    let site = state.settings();
    let filter = ProjectFilter {
        featured: Some(true),
        limit: Some(6),
        ..ProjectFilter::published()
    };
    let projects = match Project::list(&state.db, &filter).await {
        Ok(projects) => projects,
        Err(e) => return load_failed(site, e),
    };
    let blogs = match Blog::list(&state.db, Some(3)).await {
        Ok(blogs) => blogs,
        Err(e) => return load_failed(site, e),
    };

    render_template(HomeTemplate {
        site,
        projects: projects.iter().map(ProjectCard::from).collect(),
        blogs: blogs.iter().map(BlogCard::from).collect(),
    })
}

async fn about(State(state): State<Arc<AppState>>) -> Response {
    render_template(AboutTemplate {
        site: state.settings(),
        categories: category_links(None),
    })
}

#[derive(Debug, Deserialize)]
struct WorksQuery {
    category: Option<String>,
}

// Published projects, optionally one category
async fn works(State(state): State<Arc<AppState>>, Query(query): Query<WorksQuery>) -> Response {
    let site = state.settings();
    let category = ProjectFilter::category_param(query.category.as_deref());
    let filter = ProjectFilter {
        category: category.clone(),
        ..ProjectFilter::published()
    };

    match Project::list(&state.db, &filter).await {
        Ok(projects) => render_template(WorksTemplate {
            site,
            projects: projects.iter().map(ProjectCard::from).collect(),
            categories: category_links(category.as_deref()),
            filtered: category.is_some(),
        }),
        Err(e) => load_failed(site, e),
    }
}

// Case study, rendered with the showcase of the project's category
async fn work_detail(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> Response {
    let site = state.settings();
    let project = match Project::get_by_slug(&state.db, &slug).await {
        Ok(project) => project.filter(Project::is_published),
        Err(e) => return load_failed(site, e),
    };
    let Some(project) = project else {
        return message_page(
            site,
            StatusCode::NOT_FOUND,
            "Project not found",
            "This project does not exist or is not public yet.",
        );
    };

    let showcase = Showcase::for_project(&project);
    tracing::debug!(slug = %slug, template = showcase.template_name(), "Rendering project");
    match showcase.render(site, &project) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(slug = %slug, error = %e, "Template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Template error: {}", e)).into_response()
        }
    }
}

async fn blog_list(State(state): State<Arc<AppState>>) -> Response {
    let site = state.settings();
    match Blog::list(&state.db, None).await {
        Ok(blogs) => render_template(BlogListTemplate {
            site,
            blogs: blogs.iter().map(BlogCard::from).collect(),
        }),
        Err(e) => load_failed(site, e),
    }
}

async fn blog_detail(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> Response {
    let site = state.settings();
    match Blog::get_by_slug(&state.db, &slug).await {
        Ok(Some(blog)) => render_template(BlogDetailTemplate { site, blog }),
        Ok(None) => render_with_status(StatusCode::NOT_FOUND, BlogNotFoundTemplate { site }),
        Err(e) => load_failed(site, e),
    }
}

#[derive(Debug, Deserialize)]
struct PricingQuery {
    plan: Option<String>,
}

/// Render the pricing page. The order form appears once a plan is chosen
/// and carries that plan's id, name, price and currency unchanged.
async fn render_pricing(
    state: &AppState,
    selected_id: Option<&str>,
    order: OrderInput,
    notice: Option<String>,
    errors: Vec<String>,
) -> Response {
    let site = state.settings();
    let plans = match actions::get_pricing_plans(state, None).await {
        Ok(plans) => plans,
        Err(e) => return load_failed(site, e),
    };
    let selected = selected_id.and_then(|id| plans.iter().find(|p| p.id == id).cloned());
    let status = if errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    render_with_status(
        status,
        PricingTemplate {
            site,
            plans: plans.iter().map(|p| PlanCard::new(p, selected_id)).collect(),
            selected,
            order,
            notice,
            errors,
        },
    )
}

async fn pricing_page(State(state): State<Arc<AppState>>, Query(query): Query<PricingQuery>) -> Response {
    render_pricing(&state, query.plan.as_deref(), OrderInput::default(), None, Vec::new()).await
}

async fn order_submit(State(state): State<Arc<AppState>>, Form(input): Form<OrderInput>) -> Response {
    match actions::place_order(&state, &input).await {
        Ok(order) => {
            let notice = format!(
                "Thank you, {}. We received your request for the {} plan and will be in touch shortly.",
                order.name, order.plan
            );
            render_pricing(&state, None, OrderInput::default(), Some(notice), Vec::new()).await
        }
        Err(e) => {
            if e.code() != ErrorCode::ValidationError {
                tracing::error!(error = %e, "Order submission failed");
            }
            let plan_id = input.plan_id.clone();
            render_pricing(&state, Some(&plan_id), input, None, visible_errors(&e)).await
        }
    }
}

async fn contact_page(State(state): State<Arc<AppState>>) -> Response {
    render_template(ContactTemplate {
        site: state.settings(),
        form: ContactInput::default(),
        notice: None,
        errors: Vec::new(),
    })
}

async fn contact_submit(State(state): State<Arc<AppState>>, Form(input): Form<ContactInput>) -> Response {
    let site = state.settings();
    match actions::send_message(&state, &input).await {
        Ok(_) => render_template(ContactTemplate {
            site,
            form: ContactInput::default(),
            notice: Some("Thanks for reaching out. We will get back to you soon.".to_string()),
            errors: Vec::new(),
        }),
        Err(e) => render_with_status(
            StatusCode::BAD_REQUEST,
            ContactTemplate {
                site,
                form: ContactInput {
                    website_url: String::new(),
                    ..input
                },
                notice: None,
                errors: visible_errors(&e),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Message, Order};
    use crate::test_state;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(state: Arc<AppState>) -> Router {
        create_router(state.clone()).with_state(state)
    }

    async fn get_page(app: &Router, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        read(app.clone().oneshot(request).await.unwrap()).await
    }

    async fn post_form(app: &Router, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        read(app.clone().oneshot(request).await.unwrap()).await
    }

    async fn read(response: Response) -> (StatusCode, String) {
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_public_pages_render() {
        let app = app(test_state().await);
        for uri in ["/", "/about", "/works", "/blog", "/pricing", "/contact"] {
            let (status, html) = get_page(&app, uri).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert!(html.contains("Atelier"), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_unknown_blog_shows_not_found_page() {
        let app = app(test_state().await);
        let (status, html) = get_page(&app, "/blog/missing-post").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(html.contains("Blog Not Found"));
    }

    #[tokio::test]
    async fn test_blog_text_is_rendered_as_html() {
        let state = test_state().await;
        let input = crate::db::BlogInput {
            title: "Motion Notes".into(),
            text: "<h2>Frames</h2><p>Every frame counts.</p>".into(),
            ..Default::default()
        };
        actions::save_blog(&state, None, &input).await.unwrap();

        let (status, html) = get_page(&app(state), "/blog/motion-notes").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<h2>Frames</h2>"));
    }

    #[tokio::test]
    async fn test_work_detail_hides_drafts() {
        let state = test_state().await;
        let mut input = crate::db::ProjectInput {
            title: "Quiet Draft".into(),
            category: "ai-automation".into(),
            ..Default::default()
        };
        actions::save_project(&state, None, &input).await.unwrap();
        input.title = "Loud Launch".into();
        input.status = Some("published".into());
        actions::save_project(&state, None, &input).await.unwrap();

        let app = app(state);
        let (status, _) = get_page(&app, "/works/quiet-draft").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, html) = get_page(&app, "/works/loud-launch").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("AI Automation"));

        let (_, html) = get_page(&app, "/works?category=ai-automation").await;
        assert!(html.contains("Loud Launch"));
        assert!(!html.contains("Quiet Draft"));
    }

    #[tokio::test]
    async fn test_works_filter_accepts_category_alias() {
        let state = test_state().await;
        let input = crate::db::ProjectInput {
            title: "Old Storefront".into(),
            category: "web-development".into(),
            status: Some("published".into()),
            ..Default::default()
        };
        actions::save_project(&state, None, &input).await.unwrap();

        let app = app(state);
        let (status, html) = get_page(&app, "/works?category=web-dev").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Old Storefront"));
    }

    #[tokio::test]
    async fn test_contact_form_honeypot() {
        let state = test_state().await;
        let app = app(state.clone());

        let (status, html) = post_form(
            &app,
            "/contact",
            "name=Bot&email=bot%40example.com&message=Hi&website_url=spam",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(html.contains(GENERIC_ERROR));
        assert!(Message::list(&state.db).await.unwrap().is_empty());

        let (status, _) = post_form(
            &app,
            "/contact",
            "name=Ama&email=ama%40example.com&phone=&message=Hello&website_url=",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(Message::list(&state.db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_contact_validation_keeps_input() {
        let app = app(test_state().await);
        let (status, html) =
            post_form(&app, "/contact", "name=Ama&email=not-an-email&message=Hello").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(html.contains("not-an-email"));
    }

    #[tokio::test]
    async fn test_pricing_page_orders_plan() {
        let state = test_state().await;
        let plans = actions::get_pricing_plans(&state, None).await.unwrap();
        let growth = plans.iter().find(|p| p.name == "Growth").unwrap();
        let app = app(state.clone());

        let (status, html) = get_page(&app, &format!("/pricing?plan={}", growth.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(&format!("value=\"{}\"", growth.id)));
        let starter = html.find("Starter").unwrap();
        assert!(starter < html.find("Growth").unwrap());

        let body = format!(
            "name=Ama&email=ama%40example.com&phone=&message=Hi&planId={}&plan=Growth&price={}&currency={}",
            growth.id, growth.price, growth.currency
        );
        let (status, html) = post_form(&app, "/pricing", &body).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Thank you, Ama"));

        let orders = Order::list(&state.db).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].plan_id, growth.id);
        assert_eq!(orders[0].price, growth.price);
    }

    #[tokio::test]
    async fn test_unknown_page_is_404() {
        let app = app(test_state().await);
        let (status, html) = get_page(&app, "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(html.contains("Page not found"));
    }

    #[test]
    fn test_visible_errors() {
        let e = ApiError::validation_field("email", "Email is invalid");
        assert_eq!(visible_errors(&e), vec!["Email is invalid".to_string()]);
        let e = ApiError::bad_request("Submission rejected");
        assert_eq!(visible_errors(&e), vec![GENERIC_ERROR.to_string()]);
    }
}
