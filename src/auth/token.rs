//! Admin password checks and signed session tokens.
//!
//! Token format: `admin.<issued-at-ms>.<hex hmac-sha256>`, where the digest
//! covers `admin.<issued-at-ms>` and is keyed with `AUTH_SECRET`. Tokens have
//! an absolute 14-day lifetime and are never renewed. There is no revocation:
//! a token stays valid until it ages out or the signing key changes.

use crate::config::Config;
use crate::clock::now_millis;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// First segment of every admin token.
pub const TOKEN_MARKER: &str = "admin";

const DELIMITER: char = '.';

/// Absolute session lifetime in seconds. Also used as the cookie Max-Age.
pub const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 14;

/// Absolute session lifetime in milliseconds.
pub const SESSION_MAX_AGE_MS: i64 = SESSION_MAX_AGE_SECS as i64 * 1000;

/// A freshly issued session token, ready to be handed to the client.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// Password verification and token issuance for the single admin account.
///
/// Holds only read-only configuration, so one instance can be shared across
/// every request handler.
#[derive(Clone)]
pub struct Authenticator {
    admin_password: Option<Zeroizing<String>>,
    signing_key: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("has_password", &self.has_password())
            .field("has_signing_key", &self.has_signing_key())
            .finish()
    }
}

impl Authenticator {
    /// Empty strings count as "not configured".
    pub fn new(admin_password: Option<String>, signing_key: Option<String>) -> Self {
        Self {
            admin_password: admin_password.map(Zeroizing::new).filter(|p| !p.is_empty()),
            signing_key: signing_key.map(Zeroizing::new).filter(|k| !k.is_empty()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.admin_password.as_deref().cloned(),
            config.auth_secret.as_deref().cloned(),
        )
    }

    pub fn has_password(&self) -> bool {
        self.admin_password.is_some()
    }

    pub fn has_signing_key(&self) -> bool {
        self.signing_key.is_some()
    }

    /// Both the password and the signing key are present.
    pub fn is_configured(&self) -> bool {
        self.has_password() && self.has_signing_key()
    }

    /// Check a submitted password against the configured one.
    ///
    /// Returns false when no password is configured.
    pub fn verify_password(&self, submitted: &str) -> bool {
        match &self.admin_password {
            Some(expected) => constant_time_eq(submitted.as_bytes(), expected.as_bytes()),
            None => false,
        }
    }

    /// Mint a token stamped with the current time.
    ///
    /// Returns `None` when no signing key is configured.
    pub fn issue_token(&self) -> Option<SessionToken> {
        self.issue_token_at(now_millis() as i64)
    }

    pub fn issue_token_at(&self, now_ms: i64) -> Option<SessionToken> {
        let key = self.signing_key.as_deref()?;
        let payload = format!("{TOKEN_MARKER}{DELIMITER}{now_ms}");
        let digest = sign(key, &payload)?;
        Some(SessionToken(format!("{payload}{DELIMITER}{digest}")))
    }

    /// Check a token presented by the client against the current time.
    pub fn verify_token(&self, token: Option<&str>) -> bool {
        self.verify_token_at(token, now_millis() as i64)
    }

    /// Check a token as of `now_ms`.
    ///
    /// Every failure (no key, absent, malformed, forged, expired, wrong
    /// marker) collapses into `false`. Never panics on any input.
    pub fn verify_token_at(&self, token: Option<&str>, now_ms: i64) -> bool {
        let Some(key) = self.signing_key.as_deref() else {
            return false;
        };
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return false;
        };

        let parts: Vec<&str> = token.split(DELIMITER).collect();
        let [marker, issued_at, digest] = parts.as_slice() else {
            return false;
        };

        // Digest is recomputed over what was received, marker included.
        let payload = format!("{marker}{DELIMITER}{issued_at}");
        let Some(expected) = sign(key, &payload) else {
            return false;
        };
        if !constant_time_eq(digest.as_bytes(), expected.as_bytes()) {
            return false;
        }

        let Ok(issued_at) = issued_at.parse::<i64>() else {
            return false;
        };
        match now_ms.checked_sub(issued_at) {
            Some(elapsed) if elapsed < SESSION_MAX_AGE_MS => {}
            _ => return false,
        }

        *marker == TOKEN_MARKER
    }
}

/// Hex-encoded HMAC-SHA256 of `payload`.
fn sign(key: &str, payload: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Length check, then a constant-time byte comparison.
///
/// A length mismatch returns early, so only the length is observable
/// through timing.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;
    const K1_DIGEST_AT_T0: &str =
        "546abaa7a2608d8381f0c4967debde26e280b3cc10f46139bc79c162962eeb78";

    fn auth() -> Authenticator {
        Authenticator::new(Some("hunter2".to_string()), Some("k1".to_string()))
    }

    fn flip_hex(c: char) -> char {
        if c == '0' {
            '1'
        } else {
            '0'
        }
    }

    #[test]
    fn test_verify_password() {
        let auth = auth();
        assert!(auth.verify_password("hunter2"));
        assert!(!auth.verify_password("hunter3"));
        assert!(!auth.verify_password("hunter"));
        assert!(!auth.verify_password("hunter22"));
        assert!(!auth.verify_password(""));
    }

    #[test]
    fn test_verify_password_unconfigured() {
        let auth = Authenticator::new(None, Some("k1".to_string()));
        assert!(!auth.verify_password(""));
        assert!(!auth.verify_password("hunter2"));

        // Empty password in the environment is treated as unset
        let auth = Authenticator::new(Some(String::new()), Some("k1".to_string()));
        assert!(!auth.has_password());
        assert!(!auth.verify_password(""));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(constant_time_eq(b"", b""));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"", b"a"));
    }

    #[test]
    fn test_issue_token_format() {
        let token = auth().issue_token_at(T0).unwrap();
        assert_eq!(
            token.as_str(),
            format!("admin.1700000000000.{K1_DIGEST_AT_T0}")
        );

        let digest = token.as_str().rsplit('.').next().unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_issue_then_verify() {
        let auth = auth();
        let token = auth.issue_token().unwrap();
        assert!(auth.verify_token(Some(token.as_str())));
    }

    #[test]
    fn test_verify_at_same_instant() {
        let auth = auth();
        let token = auth.issue_token_at(T0).unwrap();
        assert!(auth.verify_token_at(Some(token.as_str()), T0));
    }

    #[test]
    fn test_expiry_boundary() {
        let auth = auth();
        let token = auth.issue_token_at(T0).unwrap();
        let token = Some(token.as_str());

        assert!(auth.verify_token_at(token, T0 + SESSION_MAX_AGE_MS - 1));
        assert!(!auth.verify_token_at(token, T0 + SESSION_MAX_AGE_MS));
        assert!(!auth.verify_token_at(token, T0 + SESSION_MAX_AGE_MS + 1));
    }

    #[test]
    fn test_session_lifetime_is_fourteen_days() {
        assert_eq!(SESSION_MAX_AGE_SECS, 1_209_600);
        assert_eq!(SESSION_MAX_AGE_MS, 1_209_600_000);
    }

    #[test]
    fn test_every_digest_char_flip_rejected() {
        let auth = auth();
        let token = auth.issue_token_at(T0).unwrap().into_string();
        let digest_start = token.rfind('.').unwrap() + 1;

        for i in digest_start..token.len() {
            let mut chars: Vec<char> = token.chars().collect();
            chars[i] = flip_hex(chars[i]);
            let tampered: String = chars.into_iter().collect();
            assert!(
                !auth.verify_token_at(Some(&tampered), T0),
                "flipped digest char {i} was accepted"
            );
        }
    }

    #[test]
    fn test_last_hex_char_changed() {
        let auth = auth();
        let mut token = auth.issue_token_at(T0).unwrap().into_string();
        let last = token.pop().unwrap();
        token.push(flip_hex(last));
        assert!(!auth.verify_token_at(Some(&token), T0));
    }

    #[test]
    fn test_marker_checked_even_with_valid_digest() {
        let auth = auth();
        // Correct HMAC for "user.1700000000000" under key "k1"
        let forged = "user.1700000000000.\
                      e2911b9082fbbaea028a1bddcd0a21df51e4cd6dd87ffb578b71560a26a1b3f4";
        assert!(!auth.verify_token_at(Some(forged), T0));

        let payload = "Admin.1700000000000";
        let forged = format!("{payload}.{}", sign("k1", payload).unwrap());
        assert!(!auth.verify_token_at(Some(&forged), T0));
    }

    #[test]
    fn test_timestamp_tampering_rejected() {
        let auth = auth();
        let token = auth.issue_token_at(T0).unwrap().into_string();
        let moved = token.replacen("1700000000000", "1700000000001", 1);
        assert!(!auth.verify_token_at(Some(&moved), T0));
    }

    #[test]
    fn test_non_numeric_timestamp_rejected() {
        let auth = auth();
        for ts in ["abc", "", "1.5e12", "17000000000000000000000", "NaN"] {
            let payload = format!("admin.{ts}");
            let token = format!("{payload}.{}", sign("k1", &payload).unwrap());
            assert!(!auth.verify_token_at(Some(&token), T0), "accepted ts {ts:?}");
        }
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let auth = auth();
        for ts in [i64::MIN, i64::MAX] {
            let payload = format!("admin.{ts}");
            let token = format!("{payload}.{}", sign("k1", &payload).unwrap());
            // Must not panic; i64::MIN overflows the subtraction and is rejected
            let _ = auth.verify_token_at(Some(&token), T0);
        }
        let payload = format!("admin.{}", i64::MIN);
        let token = format!("{payload}.{}", sign("k1", &payload).unwrap());
        assert!(!auth.verify_token_at(Some(&token), i64::MAX));
    }

    #[test]
    fn test_garbage_input_never_accepted() {
        let auth = auth();
        let long = "a".repeat(1_000_000);
        let many_dots = ".".repeat(100_000);
        let inputs = [
            "",
            "admin",
            "admin.1700000000000",
            "admin.1700000000000.",
            "..",
            "...",
            "admin.1700000000000.abc.def",
            "admin..deadbeef",
            "\u{0}\u{0}.\u{0}.\u{0}",
            "ädmin.١٧٠٠.ß",
            long.as_str(),
            many_dots.as_str(),
        ];
        for input in inputs {
            assert!(!auth.verify_token_at(Some(input), T0));
        }
        assert!(!auth.verify_token_at(None, T0));
    }

    #[test]
    fn test_extra_delimiter_rejected() {
        let auth = auth();
        let token = auth.issue_token_at(T0).unwrap().into_string();
        assert!(!auth.verify_token_at(Some(&format!("{token}.")), T0));
        assert!(!auth.verify_token_at(Some(&format!(".{token}")), T0));
    }

    #[test]
    fn test_different_key_rejected() {
        let token = auth().issue_token_at(T0).unwrap();
        let other = Authenticator::new(Some("hunter2".to_string()), Some("k2".to_string()));
        assert!(!other.verify_token_at(Some(token.as_str()), T0));
    }

    #[test]
    fn test_no_signing_key() {
        let auth = Authenticator::new(Some("hunter2".to_string()), None);
        assert!(auth.issue_token().is_none());
        assert!(auth.issue_token_at(T0).is_none());

        let valid = format!("admin.1700000000000.{K1_DIGEST_AT_T0}");
        assert!(!auth.verify_token_at(Some(&valid), T0));
        assert!(!auth.verify_token(None));

        let auth = Authenticator::new(Some("hunter2".to_string()), Some(String::new()));
        assert!(!auth.has_signing_key());
        assert!(auth.issue_token().is_none());
    }

    #[test]
    fn test_is_configured() {
        assert!(auth().is_configured());
        assert!(!Authenticator::new(None, Some("k1".to_string())).is_configured());
        assert!(!Authenticator::new(Some("p".to_string()), None).is_configured());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let auth = auth();
        let debug = format!("{auth:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("has_signing_key: true"));

        let token = auth.issue_token_at(T0).unwrap();
        assert!(!format!("{token:?}").contains(K1_DIGEST_AT_T0));
    }

    fn assert_zeroize_on_drop<T: zeroize::ZeroizeOnDrop>(_: &T) {}

    #[test]
    fn test_credentials_wiped_on_drop() {
        let auth = auth();
        assert_zeroize_on_drop(auth.admin_password.as_ref().unwrap());
        assert_zeroize_on_drop(auth.signing_key.as_ref().unwrap());
        assert_eq!(auth.admin_password.as_deref().map(String::as_str), Some("hunter2"));
    }

    #[test]
    fn test_from_config_carries_credentials() {
        let config = crate::config::tests::test_config();
        let auth = Authenticator::from_config(&config);
        assert!(auth.verify_password("hunter2"));
        assert_eq!(
            auth.issue_token_at(T0).unwrap().as_str(),
            format!("admin.{T0}.{K1_DIGEST_AT_T0}")
        );
    }
}
