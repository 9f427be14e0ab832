//! API route handlers and application router.

pub mod auth;
pub mod products;
pub mod stock;
pub mod upload;

use crate::auth::middleware::AppState;
use crate::error::AppError;
use crate::middleware::security_headers;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

/// Allowance on top of the image limit for multipart boundaries and headers.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Validate that a string is a valid nanoid (alphanumeric, hyphens, underscores).
pub fn validate_id(id: &str, label: &str, expected_len: usize) -> Result<(), AppError> {
    if id.len() != expected_len
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::BadRequest(format!("Invalid {} format", label)));
    }
    Ok(())
}

/// Build the API router with all endpoints.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Public
        .route("/api/stock", get(stock::list_stock))
        // Admin session
        .route("/api/admin/login", post(auth::login))
        .route("/api/admin/logout", post(auth::logout))
        .route("/api/admin/session", get(auth::session_status))
        // Admin products
        .route(
            "/api/admin/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/admin/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/api/admin/upload", post(upload::upload_image))
}

/// Full application: API routes, the static site, and shared layers.
///
/// Pages and uploaded images are served from the public directory:
/// `/` is `index.html`, `/stock` and `/admin` map to their HTML files.
/// The repository's `public/` holds plain placeholder pages; a deployment
/// replaces them with the real site.
pub fn app(state: AppState) -> Router {
    let public_dir = state.config.public_dir.clone();
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    // Explicit CORS: deny all cross-origin requests (single-origin deployment).
    let cors = CorsLayer::new();

    api_router()
        .route_service("/stock", ServeFile::new(public_dir.join("stock.html")))
        .route_service("/admin", ServeFile::new(public_dir.join("admin.html")))
        .fallback_service(ServeDir::new(public_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(axum::middleware::from_fn(security_headers))
        .with_state(state)
}
