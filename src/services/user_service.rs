use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::auth::hash_password_with_cost;
use crate::config::BootstrapAdmin;
use crate::error::AppError;
use crate::models::{Role, User, UserInput};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at";

pub async fn get_user_by_id(pool: &SqlitePool, id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))
}

pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("User", username))
}

pub async fn get_all_users(pool: &SqlitePool) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY created_at, id",
        USER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Creates a user, storing only the bcrypt hash of the password.
///
/// A username or email that is already taken fails with `AppError::Integrity`.
pub async fn create_user(
    pool: &SqlitePool,
    input: UserInput,
    bcrypt_cost: u32,
) -> Result<User, AppError> {
    input.validate()?;

    let user = User {
        id: Uuid::new_v4(),
        username: input.username,
        email: input.email,
        password_hash: hash_password_with_cost(&input.password, bcrypt_cost)?,
        role: input.role,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, role, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(user.created_at)
    .execute(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Integrity(detail) => {
            log::warn!("rejected duplicate user {}: {}", user.username, detail);
            AppError::Integrity("Username or email already registered".into())
        }
        other => other,
    })?;

    log::info!("created user {} ({})", user.username, user.role.as_str());
    get_user_by_id(pool, user.id).await
}

/// Creates the configured admin account unless it already exists.
///
/// Fails with `AppError::Integrity` when the username belongs to a non-admin user.
pub async fn ensure_admin(
    pool: &SqlitePool,
    admin: &BootstrapAdmin,
    bcrypt_cost: u32,
) -> Result<User, AppError> {
    match get_user_by_username(pool, &admin.username).await {
        Ok(existing) if existing.role == Role::Admin => Ok(existing),
        Ok(existing) => {
            log::error!(
                "bootstrap admin {} already exists without the admin role",
                existing.username
            );
            Err(AppError::Integrity(format!(
                "User {} exists but is not an admin",
                existing.username
            )))
        }
        Err(AppError::EntityNotFound { .. }) => {
            let input = UserInput {
                username: admin.username.clone(),
                email: admin.email.clone(),
                password: admin.password.clone(),
                role: Role::Admin,
            };
            create_user(pool, input, bcrypt_cost).await
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::db;

    async fn pool() -> SqlitePool {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        db::init_schema(&pool).await.unwrap();
        pool
    }

    fn input(username: &str, role: Role) -> UserInput {
        UserInput {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "password123".to_string(),
            role,
        }
    }

    #[actix_rt::test]
    async fn test_create_and_lookup_user() {
        let pool = pool().await;
        let created = create_user(&pool, input("alice", Role::User), 4)
            .await
            .unwrap();

        assert_eq!(created.username, "alice");
        assert_eq!(created.role, Role::User);
        assert!(verify_password("password123", &created.password_hash).unwrap());

        let by_name = get_user_by_username(&pool, "alice").await.unwrap();
        assert_eq!(by_name.id, created.id);
        let by_id = get_user_by_id(&pool, created.id).await.unwrap();
        assert_eq!(by_id.email, "alice@example.com");
    }

    #[actix_rt::test]
    async fn test_missing_user_is_not_found() {
        let pool = pool().await;
        assert!(matches!(
            get_user_by_username(&pool, "ghost").await,
            Err(AppError::EntityNotFound { entity: "User", .. })
        ));
        assert!(matches!(
            get_user_by_id(&pool, Uuid::new_v4()).await,
            Err(AppError::EntityNotFound { .. })
        ));
    }

    #[actix_rt::test]
    async fn test_duplicate_username_or_email_is_integrity_error() {
        let pool = pool().await;
        create_user(&pool, input("alice", Role::User), 4)
            .await
            .unwrap();

        let same_name = create_user(&pool, input("alice", Role::Admin), 4).await;
        assert!(matches!(same_name, Err(AppError::Integrity(_))));

        let mut same_email = input("alice2", Role::User);
        same_email.email = "alice@example.com".to_string();
        assert!(matches!(
            create_user(&pool, same_email, 4).await,
            Err(AppError::Integrity(_))
        ));

        assert_eq!(get_all_users(&pool).await.unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn test_invalid_input_is_rejected_before_insert() {
        let pool = pool().await;
        let mut bad = input("bob", Role::User);
        bad.email = "not-an-email".to_string();

        assert!(matches!(
            create_user(&pool, bad, 4).await,
            Err(AppError::Validation { .. })
        ));
        assert!(get_all_users(&pool).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_ensure_admin_is_idempotent() {
        let pool = pool().await;
        let admin = BootstrapAdmin {
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            password: "changeme".to_string(),
        };

        let first = ensure_admin(&pool, &admin, 4).await.unwrap();
        let second = ensure_admin(&pool, &admin, 4).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.role, Role::Admin);
        assert_eq!(get_all_users(&pool).await.unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn test_ensure_admin_rejects_non_admin_username_clash() {
        let pool = pool().await;
        create_user(&pool, input("root", Role::User), 4).await.unwrap();
        let admin = BootstrapAdmin {
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            password: "changeme".to_string(),
        };

        assert!(matches!(
            ensure_admin(&pool, &admin, 4).await,
            Err(AppError::Integrity(_))
        ));
        let users = get_all_users(&pool).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::User);
    }
}
