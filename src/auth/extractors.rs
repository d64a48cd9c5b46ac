use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use sqlx::SqlitePool;

use crate::auth::access::{load_identity, require_role};
use crate::auth::token::Claims;
use crate::error::AppError;
use crate::models::{Role, User};

/// The authenticated caller, loaded from the store.
///
/// Intended for routes behind `AuthMiddleware`, which validates the JWT and inserts its
/// `Claims` into the request extensions. Missing claims, or claims naming a user that no
/// longer exists, are rejected as `AppError::Authentication`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        let pool = req.app_data::<web::Data<SqlitePool>>().cloned();

        Box::pin(async move {
            let claims = claims.ok_or_else(AppError::invalid_credentials)?;
            let pool = pool
                .ok_or_else(|| AppError::Internal("SqlitePool missing from app data".into()))?;
            let user = load_identity(&pool, &claims).await?;
            Ok::<_, ActixError>(CurrentUser(user))
        })
    }
}

/// An authenticated caller holding the `admin` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let current = CurrentUser::from_request(req, payload);
        Box::pin(async move {
            let CurrentUser(user) = current.await?;
            Ok::<_, ActixError>(AdminUser(require_role(user, Role::Admin)?))
        })
    }
}
