use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::TokenBlocklist;
use crate::auth::issuer::TokenIssuer;
use shared::config::LiveConfig;

pub mod auth;
pub mod database;
pub mod handlers;

/// Shared per-request state. Cloning is cheap — everything inside is either
/// a pool handle or an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: LiveConfig,
    /// Signing key, algorithm and lifetimes — fixed at startup.
    pub issuer: Arc<TokenIssuer>,
    /// Revoked-jti store. Injected as a trait object so tests can substitute
    /// an in-memory fake for the SQLite-backed store.
    pub blocklist: Arc<dyn TokenBlocklist>,
}
