use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use sqlx::SqlitePool;
use tracing::error;

use crate::database::{books as db_books, users as db_users};
use crate::handlers::http::utils::json_response;
use crate::AppState;

use shared::types::jwt::TokenClaims;
use shared::types::user::UserWithBooks;

/// Return the authenticated user's own record together with the books they
/// submitted.
pub async fn handle_me(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    match load_user_with_books(&state.db, &claims.user.user_id).await {
        Ok(Some(profile)) => json_response::deliver_success_json(Some(profile)),
        Ok(None) => json_response::deliver_error_json(
            "INVALID_TOKEN",
            "Token is invalid or expired",
            StatusCode::UNAUTHORIZED,
        ),
        Err(e) => {
            error!("Database error fetching current user: {}", e);
            json_response::deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

/// Join the user row with their submitted books.
async fn load_user_with_books(
    pool: &SqlitePool,
    user_id: &str,
) -> sqlx::Result<Option<UserWithBooks>> {
    let Some(user) = db_users::get_user_by_id(pool, user_id).await? else {
        return Ok(None);
    };
    let books = db_books::list_user_books(pool, user_id).await?;
    Ok(Some(UserWithBooks { user, books }))
}
