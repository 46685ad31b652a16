//! Password hashes and session tokens for the reference backend.

use pbkdf2::password_hash::{
    Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use pbkdf2::{Algorithm, Params, Pbkdf2};
use uuid::Uuid;

/// Iteration count for new hashes; existing hashes carry their own.
const PBKDF2_ROUNDS: u32 = 29_000;
const HASH_LENGTH: usize = 32;

/// PBKDF2-SHA256 hash in PHC string form (`$pbkdf2-sha256$i=...,l=32$salt$hash`).
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())?;
    let params = Params {
        rounds: PBKDF2_ROUNDS,
        output_length: HASH_LENGTH,
    };
    let hash = Pbkdf2.hash_password_customized(
        password.as_bytes(),
        Some(Algorithm::Pbkdf2Sha256.ident()),
        None,
        params,
        &salt,
    )?;
    Ok(hash.to_string())
}

/// Constant-time check of `password` against a stored PHC string. Anything
/// that does not parse as one never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Pbkdf2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Opaque bearer value for the `access_token` cookie.
pub fn new_session_token() -> String {
    format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}
