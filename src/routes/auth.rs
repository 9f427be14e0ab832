//! Admin login, logout and session status endpoints.

use crate::auth::cookie::{clear_session_cookie, session_cookie};
use crate::auth::middleware::{is_admin, AppState};
use crate::error::AppError;
use crate::models::{LoginRequest, OkResponse, SessionStatusResponse};
use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::CookieJar;
use zeroize::Zeroizing;

/// Pull the password out of a login body. The returned copy is wiped on drop.
fn submitted_password(body: &[u8]) -> Result<Zeroizing<String>, AppError> {
    serde_json::from_slice::<LoginRequest>(body)
        .ok()
        .and_then(|req| req.password)
        .map(Zeroizing::new)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing password".to_string()))
}

/// POST /api/admin/login - Exchange the admin password for a session cookie
///
/// Order matters: a malformed request is a 400, missing server credentials
/// are a 500, and only then is the password checked.
pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let password = submitted_password(&body)?;

    if !state.auth.is_configured() {
        return Err(AppError::NotConfigured);
    }

    if !state.auth.verify_password(&password) {
        tracing::warn!(action = "login_failed", "Invalid admin password");
        return Err(AppError::InvalidPassword);
    }

    let token = state.auth.issue_token().ok_or(AppError::NotConfigured)?;

    tracing::info!(action = "login_success", "Admin logged in");

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(&token, state.config.secure_cookies),
        )],
        Json(OkResponse::ok()),
    ))
}

/// POST /api/admin/logout - Clear the session cookie
///
/// Tokens are stateless, so there is nothing to invalidate server-side.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    tracing::info!(action = "logout", "Admin session cookie cleared");

    (
        [(
            header::SET_COOKIE,
            clear_session_cookie(state.config.secure_cookies),
        )],
        Json(OkResponse::ok()),
    )
}

/// GET /api/admin/session - Report whether the caller is logged in
pub async fn session_status(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    Json(SessionStatusResponse {
        ok: true,
        authenticated: is_admin(&state, &jar),
    })
}
