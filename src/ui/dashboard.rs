// Dashboard: login, overview, content forms, orders and messages
// Every handler checks the session cookie and sends anonymous visitors to the login page

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use super::{render_template, render_with_status, templates::*};
use crate::actions;
use crate::api::auth::{token_matches, SESSION_COOKIE};
use crate::api::error::ApiError;
use crate::db::{
    Blog, Message, Order, OrderStatus, PricingPlan, Project, ProjectFilter, ProjectStatus,
};
use crate::forms::{
    BlogForm, FieldView, FormMode, FormOp, PostedFields, PricingForm, ProjectForm, SettingsForm,
};
use crate::AppState;

const SAVE_FAILED: &str = "Something went wrong while saving. Your changes are still in the form.";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(overview))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", get(logout))
        .route("/projects", get(projects_list))
        .route("/projects/new", get(project_new))
        .route("/projects/form", post(project_form_submit))
        .route("/projects/:id/edit", get(project_edit))
        .route("/projects/:id/delete", post(project_delete))
        .route("/blogs", get(blogs_list))
        .route("/blogs/new", get(blog_new))
        .route("/blogs/form", post(blog_form_submit))
        .route("/blogs/:id/edit", get(blog_edit))
        .route("/blogs/:id/delete", post(blog_delete))
        .route("/pricing", get(pricing_list))
        .route("/pricing/new", get(plan_new))
        .route("/pricing/form", post(plan_form_submit))
        .route("/pricing/:id/edit", get(plan_edit))
        .route("/pricing/:id/delete", post(plan_delete))
        .route("/orders", get(orders_list))
        .route("/orders/:id/status", post(order_status))
        .route("/messages", get(messages_list))
        .route("/messages/:id/read", post(message_read))
        .route("/settings", get(settings_page).post(settings_submit))
}

// Check if the session cookie holds the admin token
fn is_authenticated(jar: &CookieJar, state: &AppState) -> bool {
    jar.get(SESSION_COOKIE)
        .map(|c| token_matches(state, c.value()))
        .unwrap_or(false)
}

fn to_login() -> Response {
    Redirect::to("/dashboard/login").into_response()
}

fn load_failed(e: impl std::fmt::Display) -> Response {
    tracing::error!(error = %e, "Failed to load dashboard data");
    (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load data").into_response()
}

/// Log a failed save and split it into the generic banner plus field messages
fn save_failure(entity: &str, e: &ApiError) -> (Option<String>, Vec<String>) {
    tracing::error!(entity, error = %e, "Dashboard save failed");
    let mut fields: Vec<(String, Vec<String>)> = e.field_errors().into_iter().collect();
    fields.sort();
    let messages = fields
        .into_iter()
        .flat_map(|(field, messages)| messages.into_iter().map(move |m| format!("{}: {}", field, m)))
        .collect();
    (Some(SAVE_FAILED.to_string()), messages)
}

// Overview
async fn overview(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }

    let projects = Project::list(&state.db, &ProjectFilter::default())
        .await
        .map(|p| p.len() as i64)
        .unwrap_or(0);
    let published = Project::count_by_status(&state.db, ProjectStatus::Published)
        .await
        .unwrap_or(0);
    let blogs = Blog::count(&state.db).await.unwrap_or(0);
    let pending_orders = Order::count_by_status(&state.db, OrderStatus::Pending)
        .await
        .unwrap_or(0);
    let unread_messages = Message::count_unread(&state.db).await.unwrap_or(0);

    let recent_orders = Order::list(&state.db).await.unwrap_or_default();
    let recent_messages = Message::list(&state.db).await.unwrap_or_default();

    render_template(OverviewTemplate {
        counts: DashboardCounts {
            projects,
            published,
            blogs,
            pending_orders,
            unread_messages,
        },
        recent_orders: recent_orders.into_iter().take(5).collect(),
        recent_messages: recent_messages.into_iter().take(5).collect(),
    })
}

// Login page
async fn login_page() -> Response {
    render_template(LoginTemplate {
        error: None,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Deserialize)]
struct LoginForm {
    token: String,
}

async fn login_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let token = form.token.trim().to_string();
    if token_matches(&state, &token) {
        let jar = jar.add(
            Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build(),
        );
        tracing::info!("Dashboard login");
        (jar, Redirect::to("/dashboard")).into_response()
    } else {
        tracing::warn!("Dashboard login with an invalid token");
        render_with_status(
            StatusCode::UNAUTHORIZED,
            LoginTemplate {
                error: Some("Invalid token".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        )
    }
}

async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/dashboard/login"))
}

// Projects

async fn projects_list(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    match Project::list(&state.db, &ProjectFilter::default()).await {
        Ok(projects) => render_template(ProjectsTemplate {
            projects: projects.iter().map(ProjectRow::from).collect(),
        }),
        Err(e) => load_failed(e),
    }
}

fn project_form_page(
    form: &ProjectForm,
    error: Option<String>,
    field_errors: Vec<String>,
) -> ProjectFormTemplate {
    ProjectFormTemplate {
        heading: match form.mode {
            FormMode::Create => "New project".to_string(),
            FormMode::Edit { .. } => "Edit project".to_string(),
        },
        id: form.mode.id().unwrap_or_default().to_string(),
        submit_label: form.mode.submit_label().to_string(),
        categories: form.category_options(),
        statuses: form.status_options(),
        fields: form.field_views(),
        results: form.result_views(),
        error,
        field_errors,
    }
}

async fn project_new(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    render_template(project_form_page(&ProjectForm::for_project(None), None, Vec::new()))
}

async fn project_edit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    match Project::get_by_id(&state.db, &id).await {
        Ok(Some(project)) => render_template(project_form_page(
            &ProjectForm::for_project(Some(&project)),
            None,
            Vec::new(),
        )),
        Ok(None) => (StatusCode::NOT_FOUND, "Project not found").into_response(),
        Err(e) => load_failed(e),
    }
}

// Every project form POST: list ops re-render, save calls the create or update action
async fn project_form_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    let posted = PostedFields::new(pairs);
    let mut form = ProjectForm::from_posted(&posted);

    match posted.op() {
        FormOp::Save => {
            let submission = form.to_submission();
            let result = match form.mode.id() {
                None => actions::create_project(&state, &submission).await,
                Some(id) => actions::update_project(&state, id, &submission).await,
            };
            match result {
                Ok(_) => Redirect::to("/dashboard/projects").into_response(),
                Err(e) => {
                    let (error, field_errors) = save_failure("project", &e);
                    render_with_status(
                        StatusCode::BAD_REQUEST,
                        project_form_page(&form, error, field_errors),
                    )
                }
            }
        }
        op => {
            form.apply(&op);
            render_template(project_form_page(&form, None, Vec::new()))
        }
    }
}

async fn project_delete(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    if let Err(e) = actions::delete_project(&state, &id).await {
        tracing::error!(%id, error = %e, "Failed to delete project");
    }
    Redirect::to("/dashboard/projects").into_response()
}

// Shared page for the fixed-field forms
struct FormPage<'a> {
    heading: &'a str,
    action: &'a str,
    back: &'a str,
}

impl FormPage<'_> {
    fn render(
        &self,
        mode: &FormMode,
        fields: Vec<FieldView>,
        notice: Option<String>,
        error: Option<String>,
        field_errors: Vec<String>,
    ) -> EntityFormTemplate {
        EntityFormTemplate {
            heading: self.heading.to_string(),
            action: self.action.to_string(),
            back: self.back.to_string(),
            id: mode.id().unwrap_or_default().to_string(),
            submit_label: mode.submit_label().to_string(),
            fields,
            notice,
            error,
            field_errors,
        }
    }
}

const BLOG_PAGE: FormPage<'static> = FormPage {
    heading: "Blog post",
    action: "/dashboard/blogs/form",
    back: "/dashboard/blogs",
};

const PLAN_PAGE: FormPage<'static> = FormPage {
    heading: "Pricing plan",
    action: "/dashboard/pricing/form",
    back: "/dashboard/pricing",
};

const SETTINGS_PAGE: FormPage<'static> = FormPage {
    heading: "Site settings",
    action: "/dashboard/settings",
    back: "/dashboard",
};

// Blogs

async fn blogs_list(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    match actions::get_blogs(&state, None).await {
        Ok(blogs) => render_template(BlogsTemplate { blogs }),
        Err(e) => load_failed(e),
    }
}

async fn blog_new(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    let form = BlogForm::for_blog(None);
    render_template(BLOG_PAGE.render(&form.mode, form.field_views(), None, None, Vec::new()))
}

async fn blog_edit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    match Blog::get_by_id(&state.db, &id).await {
        Ok(Some(blog)) => {
            let form = BlogForm::for_blog(Some(&blog));
            render_template(BLOG_PAGE.render(&form.mode, form.field_views(), None, None, Vec::new()))
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Blog not found").into_response(),
        Err(e) => load_failed(e),
    }
}

async fn blog_form_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    let posted = PostedFields::new(pairs);
    let mut form = BlogForm::from_posted(&posted);

    match posted.op() {
        FormOp::Save => {
            let submission = form.to_submission();
            let result = match form.mode.id() {
                None => actions::create_blog(&state, &submission).await,
                Some(id) => actions::update_blog(&state, id, &submission).await,
            };
            match result {
                Ok(_) => Redirect::to("/dashboard/blogs").into_response(),
                Err(e) => {
                    let (error, field_errors) = save_failure("blog", &e);
                    render_with_status(
                        StatusCode::BAD_REQUEST,
                        BLOG_PAGE.render(&form.mode, form.field_views(), None, error, field_errors),
                    )
                }
            }
        }
        op => {
            form.apply(&op);
            render_template(BLOG_PAGE.render(&form.mode, form.field_views(), None, None, Vec::new()))
        }
    }
}

async fn blog_delete(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    if let Err(e) = actions::delete_blog(&state, &id).await {
        tracing::error!(%id, error = %e, "Failed to delete blog");
    }
    Redirect::to("/dashboard/blogs").into_response()
}

// Pricing plans

async fn pricing_list(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    match actions::get_pricing_plans(&state, None).await {
        Ok(plans) => render_template(PricingListTemplate { plans }),
        Err(e) => load_failed(e),
    }
}

async fn plan_new(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    let form = PricingForm::for_plan(None);
    render_template(PLAN_PAGE.render(&form.mode, form.field_views(), None, None, Vec::new()))
}

async fn plan_edit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    match PricingPlan::get_by_id(&state.db, &id).await {
        Ok(Some(plan)) => {
            let form = PricingForm::for_plan(Some(&plan));
            render_template(PLAN_PAGE.render(&form.mode, form.field_views(), None, None, Vec::new()))
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Pricing plan not found").into_response(),
        Err(e) => load_failed(e),
    }
}

async fn plan_form_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    let posted = PostedFields::new(pairs);
    let mut form = PricingForm::from_posted(&posted);

    match posted.op() {
        FormOp::Save => {
            let submission = form.to_submission();
            let result = match form.mode.id() {
                None => actions::create_pricing_plan(&state, &submission).await,
                Some(id) => actions::update_pricing_plan(&state, id, &submission).await,
            };
            match result {
                Ok(_) => Redirect::to("/dashboard/pricing").into_response(),
                Err(e) => {
                    let (error, field_errors) = save_failure("pricing plan", &e);
                    render_with_status(
                        StatusCode::BAD_REQUEST,
                        PLAN_PAGE.render(&form.mode, form.field_views(), None, error, field_errors),
                    )
                }
            }
        }
        op => {
            form.apply(&op);
            render_template(PLAN_PAGE.render(&form.mode, form.field_views(), None, None, Vec::new()))
        }
    }
}

async fn plan_delete(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    if let Err(e) = actions::delete_pricing_plan(&state, &id).await {
        tracing::error!(%id, error = %e, "Failed to delete pricing plan");
    }
    Redirect::to("/dashboard/pricing").into_response()
}

// Orders and messages

async fn orders_list(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    match actions::get_orders(&state).await {
        Ok(orders) => render_template(OrdersTemplate {
            orders,
            statuses: OrderStatus::ALL.iter().map(OrderStatus::as_str).collect(),
        }),
        Err(e) => load_failed(e),
    }
}

#[derive(Deserialize)]
struct StatusForm {
    status: String,
}

async fn order_status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    if let Err(e) = actions::update_order_status(&state, &id, &form.status).await {
        tracing::error!(%id, error = %e, "Failed to update order status");
    }
    Redirect::to("/dashboard/orders").into_response()
}

async fn messages_list(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    match actions::get_messages(&state).await {
        Ok(messages) => render_template(MessagesTemplate { messages }),
        Err(e) => load_failed(e),
    }
}

async fn message_read(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    if let Err(e) = actions::mark_message_read(&state, &id).await {
        tracing::error!(%id, error = %e, "Failed to mark message read");
    }
    Redirect::to("/dashboard/messages").into_response()
}

// Settings

async fn settings_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    let form = SettingsForm::for_settings(&actions::get_settings(&state));
    render_template(SETTINGS_PAGE.render(&form.mode, form.field_views(), None, None, Vec::new()))
}

async fn settings_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    if !is_authenticated(&jar, &state) {
        return to_login();
    }
    let posted = PostedFields::new(pairs);
    let form = SettingsForm::from_posted(&posted);

    match actions::update_settings(&state, &form.to_submission()).await {
        Ok(saved) => {
            let form = SettingsForm::for_settings(&saved);
            render_template(SETTINGS_PAGE.render(
                &form.mode,
                form.field_views(),
                Some("Settings saved".to_string()),
                None,
                Vec::new(),
            ))
        }
        Err(e) => {
            let (error, field_errors) = save_failure("settings", &e);
            render_with_status(
                StatusCode::BAD_REQUEST,
                SETTINGS_PAGE.render(&form.mode, form.field_views(), None, error, field_errors),
            )
        }
    }
}
