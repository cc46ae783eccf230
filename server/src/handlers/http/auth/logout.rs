use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use tracing::{error, info};

use crate::database::utils::get_timestamp;
use crate::handlers::http::utils::json_response;
use crate::AppState;

use shared::types::jwt::TokenClaims;

/// Revoke the presented access token.
///
/// The blocklist entry only needs to outlive the token itself, so its TTL
/// is the token's remaining life — after that the entry is dead weight and
/// reads as absent.
pub async fn handle_logout(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let ttl_secs = claims.remaining_secs(get_timestamp());

    if let Err(e) = state.blocklist.add(&claims.jti, ttl_secs).await {
        error!("Failed to revoke token jti={}: {}", claims.jti, e);
        return json_response::deliver_error_json(
            "INTERNAL_ERROR",
            "An internal error occurred",
            StatusCode::INTERNAL_SERVER_ERROR,
        );
    }

    info!(
        "User {} logged out, token revoked (jti={})",
        claims.user.user_id, claims.jti
    );

    json_response::deliver_success_json(Some(json!({
        "message": "Logged out successfully"
    })))
}
