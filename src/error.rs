//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every service operation returns `Result<T, AppError>`, and each variant maps onto one
//! caller-visible failure kind: a missing entity, a field-level validation failure, failed
//! authentication, insufficient role, or a storage integrity violation.
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers can return it directly.
//! Internal causes (database failures, unexpected library errors) are logged with their detail
//! and rendered to the client as a generic 500 body.
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors` and
//! `jsonwebtoken::errors::Error` allow conversion with the `?` operator. The extractor
//! payload errors (JSON body, query string, form body, path) convert as well, so requests
//! that fail to parse get the same JSON error body as every other failure.

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, ResponseError, UrlencodedError},
    http::header,
    http::StatusCode,
    HttpResponse,
};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::models::Role;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// A User or Task looked up by identifier does not exist (HTTP 404).
    EntityNotFound {
        /// Kind of entity, e.g. `"Task"`.
        entity: &'static str,
        /// The identifier that was looked up, when known.
        identifier: Option<String>,
    },
    /// A field-level constraint was violated (HTTP 422).
    Validation {
        /// Name of the offending field, when the failure concerns a single field.
        field: Option<String>,
        message: String,
    },
    /// Bad credentials, or an invalid, expired or absent token (HTTP 401).
    Authentication(String),
    /// The caller is authenticated but lacks the required role (HTTP 403).
    Authorization {
        message: String,
        required_role: Option<Role>,
    },
    /// A uniqueness or reference constraint was violated in the store (HTTP 409).
    Integrity(String),
    /// The request could not be interpreted at all (HTTP 400).
    BadRequest(String),
    /// Unexpected server-side failure (HTTP 500).
    Internal(String),
    /// Failure reported by the database driver (HTTP 500).
    Database(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, identifier: impl fmt::Display) -> Self {
        AppError::EntityNotFound {
            entity,
            identifier: Some(identifier.to_string()),
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    /// The single caller-visible message for every failed identity resolution.
    pub fn invalid_credentials() -> Self {
        AppError::Authentication("Invalid credentials".into())
    }

    pub fn requires_role(role: Role) -> Self {
        AppError::Authorization {
            message: format!("{} access required", role.as_str()),
            required_role: Some(role),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::EntityNotFound {
                entity,
                identifier: Some(id),
            } => write!(f, "{} not found: {}", entity, id),
            AppError::EntityNotFound {
                entity,
                identifier: None,
            } => write!(f, "{} not found", entity),
            AppError::Validation { message, .. } => write!(f, "{}", message),
            AppError::Authentication(msg) => write!(f, "{}", msg),
            AppError::Authorization { message, .. } => write!(f, "{}", message),
            AppError::Integrity(msg) => write!(f, "{}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::Database(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::EntityNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization { .. } => StatusCode::FORBIDDEN,
            AppError::Integrity(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation { field, message } => {
                HttpResponse::UnprocessableEntity().json(json!({
                    "error": message,
                    "field": field,
                }))
            }
            AppError::Authentication(msg) => HttpResponse::Unauthorized()
                .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
                .json(json!({ "error": msg })),
            AppError::Authorization {
                message,
                required_role,
            } => HttpResponse::Forbidden().json(json!({
                "error": message,
                "required_role": required_role,
            })),
            // Internal detail stays in the log.
            AppError::Internal(_) | AppError::Database(_) => {
                log::error!("{}", self);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }))
            }
            _ => HttpResponse::build(self.status_code()).json(json!({
                "error": self.to_string()
            })),
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// Unique and foreign-key violations become `AppError::Integrity`; everything else the
/// driver reports is a `AppError::Database` failure.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::EntityNotFound {
                entity: "Record",
                identifier: None,
            },
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation() || db_err.is_foreign_key_violation() =>
            {
                AppError::Integrity(db_err.message().to_string())
            }
            other => AppError::Database(other.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::Validation`.
///
/// When several fields fail, the lexicographically first one is reported as `field`
/// so the outcome does not depend on hash-map ordering.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let field = errors
            .field_errors()
            .keys()
            .min()
            .map(|name| name.to_string());
        AppError::Validation {
            field,
            message: errors.to_string(),
        }
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Authentication`.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        log::debug!("rejected token: {}", error);
        AppError::invalid_credentials()
    }
}

/// Pulls the field name out of serde messages such as ``missing field `title` ``.
fn field_from_message(message: &str) -> Option<String> {
    ["missing field `", "unknown field `", "duplicate field `"]
        .iter()
        .find_map(|prefix| {
            let start = message.find(prefix)? + prefix.len();
            let len = message[start..].find('`')?;
            Some(message[start..start + len].to_string())
        })
}

fn deserialize_failure(message: String) -> AppError {
    AppError::Validation {
        field: field_from_message(&message),
        message,
    }
}

/// A body that parsed as JSON but does not fit the target type is a validation failure;
/// anything wrong with the payload itself (content type, size, transport) is a bad request.
impl From<JsonPayloadError> for AppError {
    fn from(error: JsonPayloadError) -> AppError {
        match error {
            JsonPayloadError::Deserialize(e) if e.is_data() => {
                deserialize_failure(e.to_string())
            }
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<QueryPayloadError> for AppError {
    fn from(error: QueryPayloadError) -> AppError {
        match error {
            QueryPayloadError::Deserialize(e) => deserialize_failure(e.to_string()),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<UrlencodedError> for AppError {
    fn from(error: UrlencodedError) -> AppError {
        match error {
            UrlencodedError::Parse(_) => AppError::Validation {
                field: None,
                message: "Form fields could not be parsed".into(),
            },
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<PathError> for AppError {
    fn from(error: PathError) -> AppError {
        match error {
            PathError::Deserialize(e) => deserialize_failure(e.to_string()),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}
