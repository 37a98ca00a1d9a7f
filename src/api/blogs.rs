use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::ApiError;
use crate::actions;
use crate::db::{Blog, BlogInput};
use crate::AppState;

/// GET /api/blogs
pub async fn list_blogs(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let blogs = actions::get_blogs(&state, None).await?;
    Ok(Json(json!({ "success": true, "blogs": blogs })))
}

/// GET /api/blogs/:slug. A missing post answers `{success: false, error}` with 404.
pub async fn get_blog(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let response = match Blog::get_by_slug(&state.db, &slug).await? {
        Some(blog) => Json(json!({ "success": true, "blog": blog })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "Blog not found" })),
        )
            .into_response(),
    };
    Ok(response)
}

pub async fn create_blog(
    State(state): State<Arc<AppState>>,
    Json(input): Json<BlogInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let blog = actions::save_blog(&state, None, &input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "blog": blog }))))
}

pub async fn update_blog(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<BlogInput>,
) -> Result<Json<Value>, ApiError> {
    let blog = actions::save_blog(&state, Some(&id), &input).await?;
    Ok(Json(json!({ "success": true, "blog": blog })))
}

pub async fn delete_blog(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    actions::delete_blog(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
