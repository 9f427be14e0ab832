//! Public stock listing.

use crate::auth::middleware::AppState;
use crate::error::AppError;
use crate::models::{Category, Product, StockResponse};
use crate::storage;
use axum::{extract::State, response::IntoResponse, Json};

/// Split products by category, keeping their order.
pub fn split_by_category(products: Vec<Product>) -> (Vec<Product>, Vec<Product>) {
    products
        .into_iter()
        .partition(|p| p.category == Category::Refurb)
}

/// GET /api/stock - Everything on the shelf, newest update first
pub async fn list_stock(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut con = state.redis_connection().await?;
    let products = storage::product::list_products(&mut con).await?;
    let (refurb, accessories) = split_by_category(products);

    Ok(Json(StockResponse {
        ok: true,
        refurb,
        accessories,
    }))
}
