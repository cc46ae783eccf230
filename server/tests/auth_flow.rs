//! End-to-end token lifecycle tests: signup-shaped user creation, login
//! verification, gate checks, refresh and revocation — all against an
//! in-memory database.

use std::sync::Arc;

use hyper::header::{HeaderMap, HeaderValue};
use jsonwebtoken::Algorithm;
use proptest::prelude::*;
use sqlx::SqlitePool;

use server::auth::blocklist::{MemoryBlocklist, SqliteBlocklist, TokenBlocklist};
use server::auth::codec::encode_token;
use server::auth::error::AuthError;
use server::auth::gate::{BearerGate, RoleChecker};
use server::auth::issuer::{Subject, TokenIssuer};
use server::database::create::open_memory_pool;
use server::database::users::{create_user, get_user_auth, get_user_by_id, NewUser};
use server::database::utils::{get_timestamp, hash_password, verify_password};

const SECRET: &str = "0123456789abcdef0123456789abcdef";
const ROLES: &[&str] = &["admin", "user"];

fn issuer() -> TokenIssuer {
    TokenIssuer::new(SECRET.to_string(), Algorithm::HS256, 3600, 2 * 86_400)
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

async fn registered_user(pool: &SqlitePool, email: &str, password: &str) -> Subject {
    let user = create_user(
        pool,
        NewUser {
            username: email.split('@').next().unwrap().to_string(),
            email: email.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: hash_password(password).unwrap(),
        },
    )
    .await
    .unwrap();

    Subject {
        email: user.email,
        user_id: user.id,
        role: user.role,
    }
}

#[tokio::test]
async fn login_then_access_protected_endpoint() {
    let pool = open_memory_pool().await.unwrap();
    let iss = issuer();
    let blocklist = SqliteBlocklist::new(pool.clone());

    let subject = registered_user(&pool, "alice@example.com", "password123").await;

    // Credential check the way the login handler does it.
    let auth = get_user_auth(&pool, "alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(verify_password(&auth.password_hash, "password123").unwrap());
    assert!(!verify_password(&auth.password_hash, "wrong-password").unwrap());

    let access = iss.issue_access_token(&subject).unwrap();
    let claims = BearerGate::access()
        .validate(&bearer(&access), &iss, &blocklist)
        .await
        .unwrap();
    RoleChecker::new(ROLES).check(&claims).unwrap();
    assert_eq!(claims.user.user_id, subject.user_id);
}

#[tokio::test]
async fn refresh_token_only_works_at_the_refresh_gate() {
    let pool = open_memory_pool().await.unwrap();
    let iss = issuer();
    let blocklist = SqliteBlocklist::new(pool.clone());

    let subject = registered_user(&pool, "bob@example.com", "password123").await;
    let refresh = iss.issue_refresh_token(&subject).unwrap();

    // Accepted where it belongs.
    let claims = BearerGate::refresh()
        .validate(&bearer(&refresh), &iss, &blocklist)
        .await
        .unwrap();
    assert!(claims.refresh);
    assert!(claims.user.role.is_none());

    // Rejected everywhere else, including by the role gate.
    let err = BearerGate::access()
        .validate(&bearer(&refresh), &iss, &blocklist)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::WrongTokenKind { expected: "access" });
    assert_eq!(
        RoleChecker::new(ROLES).check(&claims).unwrap_err(),
        AuthError::InsufficientRole
    );
}

#[tokio::test]
async fn logout_revokes_only_the_presented_token() {
    let pool = open_memory_pool().await.unwrap();
    let iss = issuer();
    let blocklist = SqliteBlocklist::new(pool.clone());

    let subject = registered_user(&pool, "carol@example.com", "password123").await;
    let access = iss.issue_access_token(&subject).unwrap();
    let refresh = iss.issue_refresh_token(&subject).unwrap();

    // Logout: revoke the access token for its remaining life.
    let claims = iss.decode(&access).unwrap();
    blocklist
        .add(&claims.jti, claims.remaining_secs(get_timestamp()))
        .await
        .unwrap();

    let err = BearerGate::access()
        .validate(&bearer(&access), &iss, &blocklist)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::TokenRevoked);

    // The refresh token has its own jti and stays usable.
    assert!(BearerGate::refresh()
        .validate(&bearer(&refresh), &iss, &blocklist)
        .await
        .is_ok());
}

#[tokio::test]
async fn refresh_rederives_role_from_the_database() {
    let pool = open_memory_pool().await.unwrap();
    let iss = issuer();

    let subject = registered_user(&pool, "dave@example.com", "password123").await;
    assert_eq!(subject.role, "user");

    // Promote the account after the refresh token was issued.
    sqlx::query("UPDATE users SET role = 'admin' WHERE id = ?1")
        .bind(&subject.user_id)
        .execute(&pool)
        .await
        .unwrap();

    // The refresh handler re-reads the role before re-issuing.
    let user = get_user_by_id(&pool, &subject.user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.role, "admin");

    let access = iss
        .issue_access_token(&Subject {
            email: user.email,
            user_id: user.id,
            role: user.role,
        })
        .unwrap();
    let claims = iss.decode(&access).unwrap();
    assert_eq!(claims.user.role.as_deref(), Some("admin"));
    assert!(RoleChecker::new(&["admin"]).check(&claims).is_ok());
}

#[tokio::test]
async fn token_seconds_past_expiry_is_rejected_at_the_gate() {
    let iss = issuer();
    let blocklist = MemoryBlocklist::new();

    // Hand-build claims that expired 30 seconds ago, signed with the real
    // key, and present them like any other bearer token.
    let now = get_timestamp();
    let claims = shared::types::jwt::TokenClaims {
        user: shared::types::jwt::TokenUser {
            email: "late@example.com".to_string(),
            user_id: "u-late".to_string(),
            role: Some("user".to_string()),
        },
        jti: "jti-late".to_string(),
        refresh: false,
        exp: (now - 30) as usize,
        iat: (now - 3630) as usize,
    };
    let token = encode_token(&claims, SECRET, Algorithm::HS256).unwrap();

    let err = BearerGate::access()
        .validate(&bearer(&token), &iss, &blocklist)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::InvalidToken);
}

#[tokio::test]
async fn expired_blocklist_entries_read_as_absent() {
    let pool = open_memory_pool().await.unwrap();
    let blocklist = SqliteBlocklist::new(pool);

    blocklist.add("dead-jti", 0).await.unwrap();
    assert!(!blocklist.is_revoked("dead-jti").await.unwrap());

    blocklist.add("live-jti", 3600).await.unwrap();
    assert!(blocklist.is_revoked("live-jti").await.unwrap());

    let purged = blocklist.purge_expired().await.unwrap();
    assert_eq!(purged, 1);
    assert!(blocklist.is_revoked("live-jti").await.unwrap());
}

#[tokio::test]
async fn memory_blocklist_substitutes_for_sqlite() {
    let iss = issuer();
    let blocklist: Arc<dyn TokenBlocklist> = Arc::new(MemoryBlocklist::new());

    let subject = Subject {
        email: "eve@example.com".to_string(),
        user_id: "u-eve".to_string(),
        role: "user".to_string(),
    };
    let access = iss.issue_access_token(&subject).unwrap();
    let claims = iss.decode(&access).unwrap();

    blocklist.add(&claims.jti, 60).await.unwrap();
    let err = BearerGate::access()
        .validate(&bearer(&access), &iss, blocklist.as_ref())
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::TokenRevoked);
}

proptest! {
    #[test]
    fn truncated_tokens_never_decode(cut in 1usize..40) {
        let iss = issuer();
        let token = iss
            .issue_access_token(&Subject {
                email: "prop@example.com".to_string(),
                user_id: "u-prop".to_string(),
                role: "user".to_string(),
            })
            .unwrap();

        let truncated = &token[..token.len() - cut];
        prop_assert_eq!(iss.decode(truncated).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn identity_survives_issuance(email_local in "[a-z]{1,12}", role in prop::sample::select(vec!["admin", "user"])) {
        let iss = issuer();
        let email = format!("{}@example.com", email_local);
        let token = iss
            .issue_access_token(&Subject {
                email: email.clone(),
                user_id: "u-prop".to_string(),
                role: role.to_string(),
            })
            .unwrap();

        let claims = iss.decode(&token).unwrap();
        prop_assert_eq!(claims.user.email, email);
        prop_assert_eq!(claims.user.role.as_deref(), Some(role));
        prop_assert!(!claims.refresh);
    }
}
