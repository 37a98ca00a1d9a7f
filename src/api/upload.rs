//! File uploads for the dashboard: images, video and PDF documents.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

use super::error::ApiError;
use super::metrics::UPLOADS_TOTAL;
use crate::AppState;

/// Lowercase extension of `file_name` if it is on the allow-list
fn allowed_extension(file_name: &str, allowed: &[String]) -> Result<String, ApiError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if extension.is_empty() || !allowed.iter().any(|a| a.eq_ignore_ascii_case(&extension)) {
        return Err(ApiError::unsupported_media_type(format!(
            "Unsupported file type. Allowed: {}",
            allowed.join(", ")
        )));
    }
    Ok(extension)
}

/// POST /api/upload: multipart `{file}` → `{url}`
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let config = &state.config;
    let multipart_error = |e: axum::extract::multipart::MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large(format!(
                "File is too large (max {} bytes)",
                config.uploads.max_bytes
            ))
        } else {
            ApiError::bad_request(format!("Invalid upload: {}", e.body_text()))
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let extension = allowed_extension(&original_name, &config.uploads.allowed_extensions)?;
        let bytes = field.bytes().await.map_err(multipart_error)?;

        if bytes.is_empty() {
            return Err(ApiError::validation_field("file", "File is empty"));
        }
        if bytes.len() > config.uploads.max_bytes {
            return Err(ApiError::payload_too_large(format!(
                "File is too large (max {} bytes)",
                config.uploads.max_bytes
            )));
        }

        let stored_name = format!("{}.{}", uuid::Uuid::new_v4(), extension);
        let dir = &config.server.uploads_dir;
        crate::utils::ensure_dir(dir).map_err(|e| {
            tracing::error!(error = %e, dir = %dir.display(), "Cannot create uploads directory");
            ApiError::internal("Failed to store upload")
        })?;
        tokio::fs::write(dir.join(&stored_name), &bytes)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to write upload");
                ApiError::internal("Failed to store upload")
            })?;

        let url = format!(
            "{}/uploads/{}",
            config.server.public_url.trim_end_matches('/'),
            stored_name
        );
        metrics::counter!(UPLOADS_TOTAL).increment(1);
        tracing::info!(file = %original_name, stored = %stored_name, size = bytes.len(), "File uploaded");
        return Ok(Json(json!({ "url": url })));
    }

    Err(ApiError::validation_field("file", "A file is required"))
}
