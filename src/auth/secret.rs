//! Signing key generation for `AUTH_SECRET`.

use rand::Rng;

/// Generate a cryptographically random signing key.
///
/// Returns a hex-encoded string (64 characters) from 32 random bytes.
pub fn generate_signing_key() -> String {
    let mut rng = rand::rng();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);
    hex::encode(bytes)
}
