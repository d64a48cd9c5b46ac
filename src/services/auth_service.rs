use sqlx::SqlitePool;

use validator::Validate;

use crate::auth::{verify_password, AccessToken, LoginRequest, TokenService};
use crate::error::AppError;
use crate::models::User;
use crate::services::user_service;

const LOGIN_FAILED: &str = "Invalid username or password";

/// Checks a username/password pair against the store.
///
/// Unknown users, wrong passwords and corrupt stored hashes all yield the same
/// `AppError::Authentication`; the corrupt-hash case is logged as an error.
pub async fn authenticate_user(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let user = match user_service::get_user_by_username(pool, username).await {
        Ok(user) => user,
        Err(AppError::EntityNotFound { .. }) => {
            log::warn!("login rejected for unknown user {}", username);
            return Err(AppError::Authentication(LOGIN_FAILED.into()));
        }
        Err(e) => return Err(e),
    };

    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(user),
        Ok(false) => {
            log::warn!("login rejected for {}: wrong password", username);
            Err(AppError::Authentication(LOGIN_FAILED.into()))
        }
        Err(e) => {
            log::error!("login rejected for {}: {}", username, e);
            Err(AppError::Authentication(LOGIN_FAILED.into()))
        }
    }
}

/// Authenticates the caller and issues a bearer token for them.
pub async fn login_user(
    pool: &SqlitePool,
    tokens: &TokenService,
    username: &str,
    password: &str,
) -> Result<AccessToken, AppError> {
    let user = authenticate_user(pool, username, password).await?;
    let token = tokens.issue(&user)?;
    log::info!("user {} logged in", user.username);
    Ok(token)
}

/// Logs in with submitted form credentials.
///
/// Credentials that could never belong to an account (over-long username, empty password)
/// fail exactly like a wrong password rather than as a validation error.
pub async fn login(
    pool: &SqlitePool,
    tokens: &TokenService,
    credentials: &LoginRequest,
) -> Result<AccessToken, AppError> {
    if let Err(e) = credentials.validate() {
        log::warn!("login rejected: malformed credentials: {}", e);
        return Err(AppError::Authentication(LOGIN_FAILED.into()));
    }
    login_user(pool, tokens, &credentials.username, &credentials.password).await
}
