#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::json;
use taskledger::auth::TokenService;
use taskledger::models::Role;

use common::{bearer, create_user, status_of, test_config, test_pool, TEST_PASSWORD};

#[test_log::test(actix_rt::test)]
async fn test_register_and_login_flow() {
    let pool = test_pool().await;
    let config = test_config();
    let app = test_app!(pool, config);

    let register_payload = json!({
        "username": "integration_user",
        "email": "integration@example.com",
        "password": TEST_PASSWORD
    });
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let user: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(user["username"], "integration_user");
    assert_eq!(user["email"], "integration@example.com");
    assert_eq!(user["role"], "user");
    assert!(user.get("password_hash").is_none());
    assert!(user.get("password").is_none());

    // Same username and email again
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let token = common::login(&app, "integration_user").await;
    let claims = TokenService::from_config(&config.auth)
        .validate(&token)
        .expect("issued token should validate");
    assert_eq!(claims.username, "integration_user");
    assert_eq!(claims.role, Role::User);
    assert_eq!(claims.sub.to_string(), user["id"].as_str().unwrap());
}

#[actix_rt::test]
async fn test_register_ignores_requested_role() {
    let pool = test_pool().await;
    let config = test_config();
    let app = test_app!(pool, config);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "username": "sneaky",
            "email": "sneaky@example.com",
            "password": TEST_PASSWORD,
            "role": "admin"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let user: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(user["role"], "user");
}

#[actix_rt::test]
async fn test_register_validation() {
    let pool = test_pool().await;
    let config = test_config();
    let app = test_app!(pool, config);

    let cases = [
        (
            json!({ "username": "", "email": "a@example.com", "password": TEST_PASSWORD }),
            "username",
        ),
        (
            json!({ "username": "valid", "email": "not-an-email", "password": TEST_PASSWORD }),
            "email",
        ),
        (
            json!({ "username": "valid", "email": "a@example.com", "password": "123" }),
            "password",
        ),
    ];

    for (payload, field) in cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", payload);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["field"], field);
    }
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let pool = test_pool().await;
    let config = test_config();
    create_user(&pool, "alice", Role::User).await;
    let app = test_app!(pool, config);

    let mut bodies = Vec::new();
    for (username, password) in [("alice", "WrongPassword!"), ("nobody", TEST_PASSWORD)] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_form(&[("username", username), ("password", password)][..])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        bodies.push(body);
    }

    assert_eq!(bodies[0], bodies[1]);
}

#[actix_rt::test]
async fn test_out_of_range_credentials_fail_like_wrong_password() {
    let pool = test_pool().await;
    let config = test_config();
    create_user(&pool, "alice", Role::User).await;
    let app = test_app!(pool, config);

    let long_username = "a".repeat(51);
    let attempts = [
        ("alice", "WrongPassword!"),
        (long_username.as_str(), TEST_PASSWORD),
        ("alice", ""),
    ];

    let mut bodies = Vec::new();
    for (username, password) in attempts {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_form(&[("username", username), ("password", password)][..])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", username);
        let body: serde_json::Value = test::read_body_json(resp).await;
        bodies.push(body);
    }

    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[0], bodies[2]);
}

#[actix_rt::test]
async fn test_protected_routes_require_token() {
    let pool = test_pool().await;
    let config = test_config();
    let app = test_app!(pool, config);

    for uri in ["/api/tasks", "/api/users"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        assert_eq!(status_of(&app, req).await, StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(bearer("not-a-jwt"))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_expired_token_is_rejected() {
    let pool = test_pool().await;
    let config = test_config();
    let alice = create_user(&pool, "alice", Role::User).await;
    let app = test_app!(pool, config);

    let tokens = TokenService::from_config(&config.auth);
    let expired = tokens
        .issue_with_ttl(&alice, chrono::Duration::zero(), chrono::Utc::now())
        .expect("signing should succeed");

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(bearer(&expired.access_token))
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_users_listing_is_admin_only() {
    let pool = test_pool().await;
    let config = test_config();
    create_user(&pool, "alice", Role::User).await;
    create_user(&pool, "root", Role::Admin).await;
    let app = test_app!(pool, config);

    let alice_token = common::login(&app, "alice").await;
    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(bearer(&alice_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["required_role"], "admin");

    let admin_token = common::login(&app, "root").await;
    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(bearer(&admin_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let users: Vec<serde_json::Value> = test::read_body_json(resp).await;
    let mut names: Vec<&str> = users
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["alice", "root"]);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
}

#[actix_rt::test]
async fn test_health_and_root_are_public() {
    let pool = test_pool().await;
    let config = test_config();
    let app = test_app!(pool, config);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");

    let req = test::TestRequest::get().uri("/").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Task Manager API");
}
