//! Identity resolution and role checks.
//!
//! Every way identity resolution can fail (bad signature, expired token, user gone) collapses
//! to the same `AppError::Authentication("Invalid credentials")` so callers cannot tell which
//! step rejected them. The specific cause is logged.

use sqlx::SqlitePool;

use crate::auth::token::{Claims, TokenService};
use crate::error::AppError;
use crate::models::{Role, User};
use crate::services::user_service;

/// Validates `token` and loads the user it was issued to.
pub async fn resolve_identity(
    pool: &SqlitePool,
    tokens: &TokenService,
    token: &str,
) -> Result<User, AppError> {
    let claims = tokens.validate(token).map_err(|e| {
        log::debug!("token rejected: {}", e);
        AppError::invalid_credentials()
    })?;
    load_identity(pool, &claims).await
}

/// Loads the user named by already-validated claims.
pub async fn load_identity(pool: &SqlitePool, claims: &Claims) -> Result<User, AppError> {
    match user_service::get_user_by_username(pool, &claims.username).await {
        Ok(user) if user.id == claims.sub => Ok(user),
        Ok(user) => {
            log::warn!(
                "token subject {} does not match current user {} for {}",
                claims.sub,
                user.id,
                claims.username
            );
            Err(AppError::invalid_credentials())
        }
        Err(AppError::EntityNotFound { .. }) => {
            log::warn!("token presented for missing user {}", claims.username);
            Err(AppError::invalid_credentials())
        }
        Err(e) => Err(e),
    }
}

/// Returns the user unchanged if its role is exactly `role`.
pub fn require_role(user: User, role: Role) -> Result<User, AppError> {
    if user.role == role {
        Ok(user)
    } else {
        log::warn!(
            "user {} with role {} denied, {} required",
            user.username,
            user.role.as_str(),
            role.as_str()
        );
        Err(AppError::requires_role(role))
    }
}
