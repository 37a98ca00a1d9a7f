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
use crate::db::PricingPlanInput;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PricingQuery {
    pub category: Option<String>,
}

/// GET /api/pricing: `{plans}` in tier order
pub async fn list_plans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PricingQuery>,
) -> Result<Json<Value>, ApiError> {
    let category = query.category.as_deref().filter(|c| !c.trim().is_empty());
    let plans = actions::get_pricing_plans(&state, category).await?;
    Ok(Json(json!({ "plans": plans })))
}

pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PricingPlanInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let plan = actions::save_pricing_plan(&state, None, &input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "plan": plan }))))
}

pub async fn update_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<PricingPlanInput>,
) -> Result<Json<Value>, ApiError> {
    let plan = actions::save_pricing_plan(&state, Some(&id), &input).await?;
    Ok(Json(json!({ "success": true, "plan": plan })))
}

pub async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    actions::delete_pricing_plan(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
