#![allow(dead_code)]

use std::collections::HashMap;

use actix_web::http::StatusCode;
use sqlx::SqlitePool;
use taskledger::config::Config;
use taskledger::db;
use taskledger::models::{Role, User, UserInput};
use taskledger::services::user_service;

pub const TEST_SECRET: &str = "integration-test-secret-integration-test-secret";
pub const TEST_PASSWORD: &str = "Password123!";

/// Builds the full application around the given pool and config, the same way `main` does.
#[macro_export]
macro_rules! test_app {
    ($pool:expr, $config:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($pool.clone()))
                .app_data(actix_web::web::Data::new(
                    taskledger::auth::TokenService::from_config(&$config.auth),
                ))
                .app_data(actix_web::web::Data::new($config.clone()))
                .wrap(taskledger::cors($config.debug))
                .wrap(actix_web::middleware::Logger::default())
                .service(taskledger::routes::health::root)
                .service(taskledger::routes::health::health)
                .service(
                    actix_web::web::scope("/api")
                        .wrap(taskledger::auth::AuthMiddleware)
                        .configure(taskledger::routes::config),
                ),
        )
        .await
    };
}

pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = [
        ("SECRET_KEY", TEST_SECRET),
        ("BCRYPT_COST", "4"),
        ("DEBUG", "true"),
    ]
    .into_iter()
    .collect();
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("test config should be valid")
}

pub async fn test_pool() -> SqlitePool {
    let pool = db::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory database");
    db::init_schema(&pool)
        .await
        .expect("Failed to create schema");
    pool
}

pub async fn create_user(pool: &SqlitePool, username: &str, role: Role) -> User {
    user_service::create_user(
        pool,
        UserInput {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: TEST_PASSWORD.to_string(),
            role,
        },
        4,
    )
    .await
    .expect("Failed to create test user")
}

/// Logs in through `POST /api/auth/login` and returns the bearer token.
pub async fn login<S, B>(app: &S, username: &str) -> String
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    B: actix_web::body::MessageBody,
{
    let req = actix_web::test::TestRequest::post()
        .uri("/api/auth/login")
        .set_form(&[("username", username), ("password", TEST_PASSWORD)][..])
        .to_request();
    let resp = actix_web::test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "login failed for {}", username);

    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "bearer");
    body["access_token"]
        .as_str()
        .expect("access_token missing from login response")
        .to_string()
}

pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (
        actix_web::http::header::AUTHORIZATION,
        format!("Bearer {}", token),
    )
}

/// Runs a request whose rejection may come from the auth middleware and returns the
/// resulting status, whether it surfaced as a response or as a service error.
pub async fn status_of<S, B>(app: &S, req: actix_http::Request) -> StatusCode
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    B: actix_web::body::MessageBody,
{
    match actix_web::test::try_call_service(app, req).await {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    }
}
