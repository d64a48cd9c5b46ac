use crate::config::AuthConfig;
use crate::error::AppError;
use crate::models::{Role, User};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject of the token, the user's unique identifier.
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch). The token is valid while `now < exp`.
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &User, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat,
            exp: iat + ttl.num_seconds(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Bearer token handed out on login.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

impl AccessToken {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Issues and validates HMAC-signed JWTs with a process-wide secret.
///
/// Expiry is checked against the validator's clock with one-second resolution and no leeway.
/// A token issued with a zero TTL is already expired. There is no revocation: a token stays
/// valid until `exp`.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, algorithm: Algorithm, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.secret_key, config.algorithm, config.access_token_ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `user` expiring after the configured TTL.
    pub fn issue(&self, user: &User) -> Result<AccessToken, AppError> {
        self.issue_with_ttl(user, self.ttl, Utc::now())
    }

    pub fn issue_with_ttl(
        &self,
        user: &User,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<AccessToken, AppError> {
        let claims = Claims::for_user(user, issued_at, ttl);
        self.sign(&claims).map(AccessToken::bearer)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a token's signature and expiry against the current time.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        self.validate_at(token, Utc::now())
    }

    /// Verifies a token's signature, then rejects it if `now` is at or past its expiry.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below against `now`.
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;
        if claims.is_expired_at(now) {
            log::debug!("rejected expired token for {}", claims.username);
            return Err(AppError::invalid_credentials());
        }
        Ok(claims)
    }
}
