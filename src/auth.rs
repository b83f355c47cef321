//! Password hashing.
//!
//! New passwords are stored as argon2 PHC strings. Tables written by
//! earlier releases hold bcrypt hashes (`$2a$`, `$2b$`, `$2y$`); those
//! still verify, and are replaced on the next successful login.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::config::AdminConfig;
use crate::error::{CampusError, Result};

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CampusError::authentication(format!("could not hash password: {}", e)))
}

/// Prefixes of the bcrypt variants found in older `usuario` tables.
const LEGACY_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// Whether a stored hash is a bcrypt hash rather than an argon2 one.
pub fn is_legacy_hash(stored_hash: &str) -> bool {
    LEGACY_PREFIXES
        .iter()
        .any(|prefix| stored_hash.starts_with(prefix))
}

/// Check a password against a stored hash.
///
/// Accepts argon2 PHC strings and legacy bcrypt hashes. Anything else
/// never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    if is_legacy_hash(stored_hash) {
        return bcrypt::verify(password, stored_hash).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "stored bcrypt hash is malformed");
            false
        });
    }

    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Check admin credentials against the configured account.
pub fn authenticate_admin(admin: &AdminConfig, username: &str, password: &str) -> Result<()> {
    let Some(stored) = admin.password_hash.as_deref() else {
        return Err(CampusError::authentication(
            "admin password is not configured (set admin.password_hash)",
        ));
    };

    if username == admin.username && verify_password(password, stored) {
        Ok(())
    } else {
        Err(CampusError::authentication("invalid admin credentials"))
    }
}
