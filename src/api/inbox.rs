//! Order and contact submissions, and their admin views.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::ApiError;
use crate::actions;
use crate::db::{ContactInput, Message, MessageStatus, OrderInput, UpdateStatusRequest};
use crate::AppState;

/// POST /api/orders
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(input): Json<OrderInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let order = actions::place_order(&state, &input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "order": order }))))
}

/// POST /api/contact
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ContactInput>,
) -> Result<Json<Value>, ApiError> {
    actions::send_message(&state, &input).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn list_orders(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let orders = actions::get_orders(&state).await?;
    Ok(Json(json!({ "success": true, "orders": orders })))
}

pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    let order = actions::update_order_status(&state, &id, &req.status).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

pub async fn list_messages(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let messages = actions::get_messages(&state).await?;
    Ok(Json(json!({ "success": true, "messages": messages })))
}

pub async fn update_message_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    let status: MessageStatus = req
        .status
        .parse()
        .map_err(|e: String| ApiError::validation_field("status", e))?;
    let message = match status {
        MessageStatus::Read => actions::mark_message_read(&state, &id).await?,
        MessageStatus::New => Message::set_status(&state.db, &id, status)
            .await?
            .ok_or_else(|| ApiError::not_found("Message not found"))?,
    };
    Ok(Json(json!({ "success": true, "message": message })))
}
