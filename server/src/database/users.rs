use sqlx::SqlitePool;

use crate::database::utils::{generate_uuid_token, get_timestamp};
use shared::types::user::UserPublic;

/// Data required to INSERT a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Minimal data needed to verify a user's credentials and issue tokens.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub id: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
}

/// Check whether an email is already registered
pub async fn email_exists(pool: &SqlitePool, email: &str) -> sqlx::Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE email = ?1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Check whether a username is already taken
pub async fn username_exists(pool: &SqlitePool, username: &str) -> sqlx::Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE username = ?1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Insert a new user and return its public record. New accounts always get
/// the 'user' role; promotion to admin happens outside the API.
pub async fn create_user(pool: &SqlitePool, new_user: NewUser) -> sqlx::Result<UserPublic> {
    let id = generate_uuid_token();
    let now = get_timestamp();

    sqlx::query(
        "INSERT INTO users (id, username, email, first_name, last_name, role, password_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'user', ?6, ?7, ?7)",
    )
    .bind(&id)
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(&new_user.password_hash)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(UserPublic {
        id,
        username: new_user.username,
        email: new_user.email,
        first_name: new_user.first_name,
        last_name: new_user.last_name,
        role: "user".to_string(),
        created_at: now,
    })
}

/// Get credential-check data by email
pub async fn get_user_auth(pool: &SqlitePool, email: &str) -> sqlx::Result<Option<UserAuth>> {
    let row: Option<(String, String, String, String)> = sqlx::query_as(
        "SELECT id, email, role, password_hash FROM users WHERE email = ?1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, email, role, password_hash)| UserAuth {
        id,
        email,
        role,
        password_hash,
    }))
}

/// Get a user's public record by id — used on refresh (role re-derivation)
/// and by the `/me` endpoint.
pub async fn get_user_by_id(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<UserPublic>> {
    let row: Option<(String, String, String, String, String, String, i64)> = sqlx::query_as(
        "SELECT id, username, email, first_name, last_name, role, created_at
         FROM users WHERE id = ?1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(id, username, email, first_name, last_name, role, created_at)| UserPublic {
            id,
            username,
            email,
            first_name,
            last_name,
            role,
            created_at,
        },
    ))
}

/// Get a user's public record by email — review creation resolves the
/// reviewer through this.
pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> sqlx::Result<Option<UserPublic>> {
    let row: Option<(String, String, String, String, String, String, i64)> = sqlx::query_as(
        "SELECT id, username, email, first_name, last_name, role, created_at
         FROM users WHERE email = ?1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(id, username, email, first_name, last_name, role, created_at)| UserPublic {
            id,
            username,
            email,
            first_name,
            last_name,
            role,
            created_at,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create::open_memory_pool;

    fn sample_user() -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Archer".to_string(),
            password_hash: "$argon2id$fake".to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_lookup() {
        let pool = open_memory_pool().await.unwrap();

        assert!(!email_exists(&pool, "alice@example.com").await.unwrap());
        let created = create_user(&pool, sample_user()).await.unwrap();
        assert_eq!(created.role, "user");
        assert!(email_exists(&pool, "alice@example.com").await.unwrap());
        assert!(username_exists(&pool, "alice").await.unwrap());

        let auth = get_user_auth(&pool, "alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(auth.id, created.id);
        assert_eq!(auth.role, "user");

        let by_id = get_user_by_id(&pool, &created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        let by_email = get_user_by_email(&pool, "alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn unknown_lookups_return_none() {
        let pool = open_memory_pool().await.unwrap();
        assert!(get_user_auth(&pool, "ghost@example.com")
            .await
            .unwrap()
            .is_none());
        assert!(get_user_by_id(&pool, "no-such-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_violates_unique_constraint() {
        let pool = open_memory_pool().await.unwrap();
        create_user(&pool, sample_user()).await.unwrap();

        let mut dup = sample_user();
        dup.username = "alice2".to_string();
        assert!(create_user(&pool, dup).await.is_err());
    }
}
