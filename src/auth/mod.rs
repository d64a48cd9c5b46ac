pub mod access;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use access::{load_identity, require_role, resolve_identity};
pub use extractors::{AdminUser, CurrentUser};
pub use middleware::AuthMiddleware;
pub use password::{hash_password, hash_password_with_cost, verify_password};
pub use token::{AccessToken, Claims, TokenService};

/// Login credentials, submitted as an OAuth2 password form
/// (`application/x-www-form-urlencoded`).
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Payload for self-service registration. Registered accounts always get the `user` role.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}
