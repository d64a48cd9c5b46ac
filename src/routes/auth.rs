use crate::{
    auth::{LoginRequest, RegisterRequest, TokenService},
    config::Config,
    error::AppError,
    models::{Role, UserInput},
    services::{auth_service, user_service},
};
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::SqlitePool;
use validator::Validate;

/// Login user
///
/// Takes an OAuth2 password form (`username`, `password`) and returns
/// `{"access_token": ..., "token_type": "bearer"}`. Unknown users, wrong passwords and
/// out-of-range credentials all answer 401 with the same message.
#[post("/login")]
pub async fn login(
    pool: web::Data<SqlitePool>,
    tokens: web::Data<TokenService>,
    form: web::Form<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let token = auth_service::login(&pool, &tokens, &form).await?;
    Ok(HttpResponse::Ok().json(token))
}

/// Register a new user
///
/// Creates a `user`-role account. Duplicate usernames or emails answer 409.
#[post("/register")]
pub async fn register(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let RegisterRequest {
        username,
        email,
        password,
    } = register_data.into_inner();
    let input = UserInput {
        username,
        email,
        password,
        role: Role::User,
    };

    let user = user_service::create_user(&pool, input, config.auth.bcrypt_cost).await?;
    Ok(HttpResponse::Created().json(user))
}
