//! Project endpoints: the public published listing and admin CRUD.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::ApiError;
use crate::actions;
use crate::db::{Project, ProjectFilter, ProjectInput};
use crate::AppState;

const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub featured: Option<bool>,
}

impl ProjectQuery {
    fn filter(&self, published_only: bool) -> ProjectFilter {
        ProjectFilter {
            category: ProjectFilter::category_param(self.category.as_deref()),
            featured: self.featured,
            published_only,
            limit: self.limit.map(|l| l.clamp(1, MAX_LIMIT)),
        }
    }
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Value>, ApiError> {
    let projects = actions::get_projects(&state, &query.filter(true)).await?;
    Ok(Json(json!({ "success": true, "projects": projects })))
}

/// GET /api/projects/:slug. Drafts and archived projects are not found.
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let project = Project::get_by_slug(&state.db, &slug)
        .await?
        .filter(Project::is_published)
        .ok_or_else(|| ApiError::not_found("Project not found"))?;
    Ok(Json(json!({ "success": true, "project": project.to_response() })))
}

/// GET /api/admin/projects: every status
pub async fn list_all_projects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Value>, ApiError> {
    let projects = actions::get_projects(&state, &query.filter(false)).await?;
    Ok(Json(json!({ "success": true, "projects": projects })))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProjectInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let project = actions::save_project(&state, None, &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "project": project })),
    ))
}

pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<ProjectInput>,
) -> Result<Json<Value>, ApiError> {
    let project = actions::save_project(&state, Some(&id), &input).await?;
    Ok(Json(json!({ "success": true, "project": project })))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    actions::delete_project(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
