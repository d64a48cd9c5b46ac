use crate::{auth::AdminUser, error::AppError, services::user_service};
use actix_web::{get, web, HttpResponse, Responder};
use sqlx::SqlitePool;

/// Lists all users. Admin only; password hashes are never included.
#[get("")]
pub async fn list_users(
    pool: web::Data<SqlitePool>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let users = user_service::get_all_users(&pool).await?;
    Ok(HttpResponse::Ok().json(users))
}
