use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use tracing::{error, info, warn};

use crate::auth::issuer::Subject;
use crate::database::users as db_users;
use crate::handlers::http::utils::json_response;
use crate::AppState;

use shared::types::jwt::TokenClaims;

/// Exchange a valid refresh token for a fresh access token.
///
/// The refresh token deliberately carries no role, so the current role is
/// re-read from the users table here — a promotion or demotion takes
/// effect on the next refresh, not at the old token's expiry.
pub async fn handle_refresh(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing token refresh for user {}", claims.user.user_id);

    let user = match db_users::get_user_by_id(&state.db, &claims.user.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            // Account deleted since the refresh token was issued.
            warn!("Refresh for unknown user {}", claims.user.user_id);
            return json_response::deliver_error_json(
                "INVALID_TOKEN",
                "Token is invalid or expired",
                StatusCode::UNAUTHORIZED,
            );
        }
        Err(e) => {
            error!("Database error during refresh: {}", e);
            return json_response::deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            );
        }
    };

    let access_token = match state.issuer.issue_access_token(&Subject {
        email: user.email,
        user_id: user.id,
        role: user.role,
    }) {
        Ok(token) => token,
        Err(e) => {
            error!("Access token issuance failed: {}", e);
            return json_response::deliver_error_json(
                "INTERNAL_ERROR",
                "An internal error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            );
        }
    };

    json_response::deliver_success_json(Some(json!({
        "access_token": access_token,
        "expires_in": state.issuer.access_ttl_secs(),
    })))
}
