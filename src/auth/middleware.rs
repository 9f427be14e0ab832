//! Axum extractors for the admin session gate.

use crate::auth::cookie::ADMIN_COOKIE_NAME;
use crate::auth::token::Authenticator;
use crate::config::Config;
use crate::error::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub redis: redis::Client,
    pub config: Arc<Config>,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(redis: redis::Client, config: Config) -> Self {
        let auth = Authenticator::from_config(&config);
        Self {
            redis,
            config: Arc::new(config),
            auth: Arc::new(auth),
        }
    }

    /// Open a multiplexed Redis connection for one request.
    pub async fn redis_connection(
        &self,
    ) -> Result<redis::aio::MultiplexedConnection, AppError> {
        self.redis
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))
    }
}

/// Whether the request carries a valid admin session cookie.
pub fn is_admin(state: &AppState, jar: &CookieJar) -> bool {
    let token = jar.get(ADMIN_COOKIE_NAME).map(|c| c.value());
    state.auth.verify_token(token)
}

/// Admin-only session extractor.
///
/// Verifies the `mrtech_admin` cookie before the handler runs.
/// Returns 401 Unauthorized if it is missing, malformed, forged or expired.
pub struct AdminSession;

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        if !is_admin(state, &jar) {
            return Err(AppError::Unauthorized);
        }

        Ok(AdminSession)
    }
}
