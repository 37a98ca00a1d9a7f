use axum::{extract::State, Json};
use std::sync::Arc;

use super::error::ApiError;
use crate::actions;
use crate::db::SiteSettings;
use crate::AppState;

/// GET /api/settings
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SiteSettings> {
    Json(actions::get_settings(&state).as_ref().clone())
}

/// PUT /api/admin/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<SiteSettings>,
) -> Result<Json<SiteSettings>, ApiError> {
    let saved = actions::save_settings(&state, &settings).await?;
    Ok(Json(saved.as_ref().clone()))
}
