use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;
use tracing::error;

use crate::{Result, StoreError};

/// Hash a plaintext password with Argon2id and a fresh random salt.
/// Returns the PHC string, which embeds the salt and parameters.
pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::Hash(e.to_string()))
}

/// Constant-time check of `plain` against a stored PHC string.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| StoreError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Well-formed PHC string with `Argon2::default()` parameters. Verifying
/// against it costs a full hash computation and never succeeds.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$NwZttiMQoDdFKGgryTgDrQ$2eGSxeQglPYghKSvfaVc9TqXfLE3Fs8V9ruj5wHWJ0Q";

/// Spend the same work as a real verification when the username is unknown,
/// so response timing does not reveal which usernames exist.
pub fn verify_against_dummy(plain: &str) {
    if let Err(e) = verify_password(plain, DUMMY_HASH) {
        error!("Dummy password verification failed: {}", e);
    }
}
