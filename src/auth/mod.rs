//! Admin authentication: password check, signed session tokens, and the
//! cookie that carries them.

pub mod cookie;
pub mod middleware;
pub mod secret;
pub mod token;

pub use middleware::{is_admin, AdminSession, AppState};
pub use secret::generate_signing_key;
pub use token::{Authenticator, SessionToken};
