//! Process configuration, read once at start-up and passed to the components that need it.

use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::env;
use std::fmt;
use std::str::FromStr;

pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, reason } => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for token signing and password hashing.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub algorithm: Algorithm,
    pub access_token_ttl: Duration,
    pub bcrypt_cost: u32,
}

/// Credentials for an admin account created at start-up if it does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub debug: bool,
    pub auth: AuthConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("SECRET_KEY").ok_or(ConfigError::Missing("SECRET_KEY"))?;
        if secret_key.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "SECRET_KEY",
                reason: format!("must be at least {} characters", MIN_SECRET_LEN),
            });
        }

        let algorithm = match lookup("ALGORITHM") {
            Some(raw) => parse_algorithm(&raw)?,
            None => Algorithm::HS256,
        };

        let ttl_minutes: i64 = parse_or(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        // A zero TTL would issue tokens that are already expired.
        if ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                reason: "must be positive".into(),
            });
        }

        let bcrypt_cost: u32 = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                reason: "must be between 4 and 31".into(),
            });
        }

        let bootstrap_admin = match (
            lookup("ADMIN_USERNAME"),
            lookup("ADMIN_EMAIL"),
            lookup("ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(email), Some(password)) => Some(BootstrapAdmin {
                username,
                email,
                password,
            }),
            (None, None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    key: "ADMIN_USERNAME",
                    reason: "ADMIN_USERNAME, ADMIN_EMAIL and ADMIN_PASSWORD must be set together"
                        .into(),
                })
            }
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://taskledger.db?mode=rwc".to_string()),
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            server_port: parse_or(&lookup, "SERVER_PORT", 8080)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            debug: parse_or(&lookup, "DEBUG", false)?,
            auth: AuthConfig {
                secret_key,
                algorithm,
                access_token_ttl: Duration::minutes(ttl_minutes),
                bcrypt_cost,
            },
            bootstrap_admin,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    match Algorithm::from_str(raw.trim()) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigError::Invalid {
            key: "ALGORITHM",
            reason: format!("unsupported algorithm {}, expected HS256, HS384 or HS512", raw),
        }),
    }
}
