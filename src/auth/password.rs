use crate::error::AppError;
use bcrypt::{hash, verify, DEFAULT_COST};

/// Hashes a password with a fresh random salt at bcrypt's default cost.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Checks `password` against a stored bcrypt hash.
///
/// A mismatch is `Ok(false)`. A stored hash that bcrypt cannot parse is corrupt data and
/// comes back as `AppError::Integrity`, so callers can tell the two apart in their logs.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::Integrity(format!("Stored password hash is malformed: {}", e)))
}
