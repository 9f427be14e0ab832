//! Session cookie contract.

use crate::auth::token::{SessionToken, SESSION_MAX_AGE_SECS};

/// Name of the cookie carrying the admin session token.
pub const ADMIN_COOKIE_NAME: &str = "mrtech_admin";

/// `Set-Cookie` value that stores a freshly issued token.
///
/// Max-Age matches the verification ceiling so the browser drops the cookie
/// at the same moment the server would start rejecting it.
pub fn session_cookie(token: &SessionToken, secure: bool) -> String {
    with_attributes(
        format!(
            "{ADMIN_COOKIE_NAME}={}; Max-Age={SESSION_MAX_AGE_SECS}",
            token.as_str()
        ),
        secure,
    )
}

/// `Set-Cookie` value that deletes the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    with_attributes(format!("{ADMIN_COOKIE_NAME}=; Max-Age=0"), secure)
}

fn with_attributes(mut cookie: String, secure: bool) -> String {
    cookie.push_str("; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
