//! Security headers middleware.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// Content Security Policy for the site: same-origin everything, product
/// images may also come from data URIs or any HTTPS host.
const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
     img-src 'self' data: https:; \
     object-src 'none'; \
     frame-ancestors 'none'; \
     base-uri 'self'; \
     form-action 'self'";

/// Middleware that adds security headers to all responses.
///
/// - **X-Content-Type-Options: nosniff** so uploaded images are never
///   reinterpreted as scripts or HTML.
/// - **X-Frame-Options: DENY** against clickjacking of the admin panel.
/// - **Referrer-Policy: strict-origin-when-cross-origin**
/// - **Permissions-Policy** disables camera, microphone, geolocation, payment.
/// - **Content-Security-Policy**, see [`CONTENT_SECURITY_POLICY`].
///
/// API responses (`/api/...`) are additionally marked `Cache-Control: no-store`
/// since they carry session state and admin data. Static pages and images
/// keep the caching headers the file service sets.
///
/// # Usage
///
/// ```rust,no_run
/// use axum::Router;
/// use axum::middleware;
/// use mrtech::middleware::security_headers;
///
/// let app: Router = Router::new()
///     .layer(middleware::from_fn(security_headers));
/// ```
pub async fn security_headers(request: Request, next: Next) -> Response {
    let is_api = request.uri().path().starts_with("/api/");
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    if is_api {
        headers.insert("cache-control", HeaderValue::from_static("no-store"));
    }
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "permissions-policy",
        HeaderValue::from_static("camera=(), microphone=(), geolocation=(), payment=()"),
    );
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );

    response
}
