use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use tracing::{error, info, warn};

use crate::auth::issuer::Subject;
use crate::database::{users as db_users, utils as db_utils};
use crate::handlers::http::utils::{body, json_response};
use crate::AppState;

use shared::types::login::{LoginData, LoginError, LoginResponse};
use shared::types::user::UserSummary;

/// Main login handler
pub async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing login request");

    // Parse credentials (JSON or form body)
    let login_data = match parse_login_body(req).await {
        Ok(data) => data,
        Err(login_error) => {
            warn!("Login parsing failed: {:?}", login_error.to_code());
            return deliver_login_response(login_error.to_response(), StatusCode::BAD_REQUEST);
        }
    };

    // Validate input
    if let Err(login_error) = validate_login(&login_data) {
        warn!("Login validation failed: {:?}", login_error.to_code());
        return deliver_login_response(login_error.to_response(), StatusCode::BAD_REQUEST);
    }

    // Attempt login
    match attempt_login(&login_data, &state).await {
        Ok(response_data) => {
            info!("User logged in successfully: {}", login_data.email);
            deliver_login_response(response_data, StatusCode::OK)
        }
        Err(login_error) => {
            warn!("Login failed: {:?}", login_error.to_code());
            let status = match login_error {
                LoginError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                LoginError::MissingField(_) | LoginError::InvalidBody => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            deliver_login_response(login_error.to_response(), status)
        }
    }
}

/// Parse login credentials from a JSON or form-urlencoded body
async fn parse_login_body(
    req: Request<hyper::body::Incoming>,
) -> std::result::Result<LoginData, LoginError> {
    let bytes = body::collect_body(req)
        .await
        .map_err(|_| LoginError::InternalError)?;

    if body::looks_like_json(&bytes) {
        return serde_json::from_slice::<LoginData>(&bytes).map_err(|_| LoginError::InvalidBody);
    }

    let params = body::form_params(&bytes);

    let email = params
        .get("email")
        .ok_or(LoginError::MissingField("email".to_string()))?
        .trim()
        .to_string();

    let password = params
        .get("password")
        .ok_or(LoginError::MissingField("password".to_string()))?
        .to_string();

    Ok(LoginData { email, password })
}

/// Validate login data
fn validate_login(data: &LoginData) -> std::result::Result<(), LoginError> {
    if data.email.is_empty() {
        return Err(LoginError::MissingField("email".to_string()));
    }

    if data.password.is_empty() {
        return Err(LoginError::MissingField("password".to_string()));
    }

    Ok(())
}

/// Attempt to log in the user using the database.
///
/// Unknown email and wrong password both collapse to `InvalidCredentials`
/// so the response never reveals whether an account exists.
async fn attempt_login(
    data: &LoginData,
    state: &AppState,
) -> std::result::Result<LoginResponse, LoginError> {
    let user_auth = db_users::get_user_auth(&state.db, &data.email)
        .await
        .map_err(|e| {
            error!("Database error getting user auth: {}", e);
            LoginError::DatabaseError
        })?
        .ok_or(LoginError::InvalidCredentials)?;

    let password_valid =
        db_utils::verify_password(&user_auth.password_hash, &data.password).map_err(|e| {
            error!("Password verification error: {}", e);
            LoginError::InternalError
        })?;

    if !password_valid {
        return Err(LoginError::InvalidCredentials);
    }

    let subject = Subject {
        email: user_auth.email.clone(),
        user_id: user_auth.id.clone(),
        role: user_auth.role.clone(),
    };

    let access_token = state.issuer.issue_access_token(&subject).map_err(|e| {
        error!("Access token issuance failed: {}", e);
        LoginError::InternalError
    })?;
    let refresh_token = state.issuer.issue_refresh_token(&subject).map_err(|e| {
        error!("Refresh token issuance failed: {}", e);
        LoginError::InternalError
    })?;

    Ok(LoginResponse::Success {
        message: "Login successful".to_string(),
        access_token,
        refresh_token,
        user: UserSummary {
            email: user_auth.email,
            uid: user_auth.id,
        },
    })
}

/// Deliver a login response envelope
fn deliver_login_response(
    response: LoginResponse,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    json_response::deliver_serialized_json(&response, status)
}
