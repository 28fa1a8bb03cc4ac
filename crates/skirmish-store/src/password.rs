//! Password hashing with Argon2.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$...`), which carry
//! their own salt and parameters.

use std::sync::OnceLock;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::Rng;

use crate::StoreError;

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, StoreError> {
    if password.is_empty() {
        return Err(StoreError::InvalidInput("empty password".into()));
    }
    let salt_raw: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_raw)
        .map_err(|e| StoreError::Hash(e.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::Hash(e.to_string()))
}

/// Checks `password` against a stored PHC string.
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        tracing::warn!("stored password hash is malformed");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// A hash of a throwaway password, computed once.
///
/// Verifying against it costs the same as a real check, so a lookup miss
/// takes as long as a wrong password. `None` only if hashing itself fails.
pub(crate) fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("skirmish-unknown-account").ok())
        .as_deref()
}
