//! Product image upload endpoint.

use crate::auth::middleware::{AdminSession, AppState};
use crate::error::AppError;
use crate::clock::now_millis;
use crate::models::UploadResponse;
use crate::storage::upload::{extension_for_mime, upload_filename, upload_url, write_upload};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};

fn too_large(max_bytes: usize) -> AppError {
    AppError::PayloadTooLarge(format!(
        "File too large (max {}MB)",
        max_bytes / (1024 * 1024)
    ))
}

fn form_error(err: MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_bytes)
    } else {
        AppError::BadRequest("Invalid form data".to_string())
    }
}

/// POST /api/admin/upload - Store a product image
///
/// Accepts multipart form with a `file` part (JPEG, PNG or WEBP).
/// Returns the public URL of the stored image.
pub async fn upload_image(
    _admin: AdminSession,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let max_bytes = state.config.max_upload_bytes;
    let mut multipart =
        multipart.map_err(|_| AppError::BadRequest("Invalid form data".to_string()))?;

    let mut file: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, max_bytes))?
    {
        // Only a part carrying a filename counts as a file.
        if field.name() != Some("file") || field.file_name().is_none() {
            continue;
        }

        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await.map_err(|e| form_error(e, max_bytes))?;
        file = Some((content_type, data.to_vec()));
        break;
    }

    let (content_type, data) =
        file.ok_or_else(|| AppError::BadRequest("Missing file".to_string()))?;

    if data.len() > max_bytes {
        return Err(too_large(max_bytes));
    }

    let ext = content_type
        .as_deref()
        .and_then(extension_for_mime)
        .ok_or_else(|| {
            AppError::UnsupportedMediaType(
                "Unsupported file type. Use JPG, PNG, or WEBP.".to_string(),
            )
        })?;

    let filename = upload_filename(ext, now_millis());
    write_upload(&state.config.uploads_dir, &filename, &data)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

    tracing::info!(
        action = "image_uploaded",
        filename = %filename,
        size = data.len(),
        "Product image stored"
    );

    Ok(Json(UploadResponse {
        ok: true,
        url: upload_url(&filename),
    }))
}
