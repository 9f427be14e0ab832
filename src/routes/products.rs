//! Admin product management endpoints.

use crate::auth::middleware::{AdminSession, AppState};
use crate::clock::now_millis;
use crate::error::AppError;
use crate::models::{OkResponse, ProductListResponse, ProductResponse};
use crate::routes::validate_id;
use crate::storage;
use crate::validation::{NewProduct, ProductPatch};
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;

/// Length of generated product IDs.
pub const PRODUCT_ID_LEN: usize = 12;

/// GET /api/admin/products - List every product, newest update first
pub async fn list_products(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let mut con = state.redis_connection().await?;
    let products = storage::product::list_products(&mut con).await?;

    Ok(Json(ProductListResponse { ok: true, products }))
}

/// POST /api/admin/products - Create a product
///
/// An unparseable body is treated like an empty one.
pub async fn create_product(
    _admin: AdminSession,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let value: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let new_product = NewProduct::from_json(&value)?;

    let product = new_product.into_product(nanoid::nanoid!(PRODUCT_ID_LEN), now_millis());

    let mut con = state.redis_connection().await?;
    storage::product::save_product(&mut con, &product).await?;

    tracing::info!(
        action = "product_created",
        product_id = %product.id,
        category = %product.category,
        "Product created"
    );

    Ok(Json(ProductResponse { ok: true, product }))
}

/// PUT /api/admin/products/{id} - Update a product
///
/// Only fields present in the body change. `updatedAt` is always refreshed.
/// A product deleted while the update is in flight is reported as not found.
pub async fn update_product(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    validate_id(&id, "product ID", PRODUCT_ID_LEN)?;

    let value: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Invalid body".to_string()))?;
    let patch = ProductPatch::from_json(&value)?;

    let mut con = state.redis_connection().await?;
    let product = storage::product::update_product(&mut con, &id, |product| {
        patch.clone().apply(product, now_millis())
    })
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    tracing::info!(action = "product_updated", product_id = %id, "Product updated");

    Ok(Json(ProductResponse { ok: true, product }))
}

/// DELETE /api/admin/products/{id} - Delete a product
pub async fn delete_product(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_id(&id, "product ID", PRODUCT_ID_LEN)?;

    let mut con = state.redis_connection().await?;
    let deleted = storage::product::delete_product(&mut con, &id).await?;

    if !deleted {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    tracing::info!(action = "product_deleted", product_id = %id, "Product deleted");

    Ok(Json(OkResponse::ok()))
}
