use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use tracing::{error, info, warn};

use crate::database::{users as db_users, utils as db_utils};
use crate::handlers::http::utils::{body, json_response};
use crate::AppState;

use shared::types::signup::{SignupData, SignupError, SignupResponse};

/// Main signup handler
pub async fn handle_signup(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing signup request");

    let signup_data = match parse_signup_body(req).await {
        Ok(data) => data,
        Err(signup_error) => {
            warn!("Signup parsing failed: {:?}", signup_error.to_code());
            return deliver_signup_response(signup_error.to_response(), StatusCode::BAD_REQUEST);
        }
    };

    if let Err(signup_error) = validate_signup(&signup_data) {
        warn!("Signup validation failed: {:?}", signup_error.to_code());
        return deliver_signup_response(signup_error.to_response(), StatusCode::BAD_REQUEST);
    }

    match attempt_signup(&signup_data, &state).await {
        Ok(response_data) => {
            info!("User registered: {}", signup_data.username);
            deliver_signup_response(response_data, StatusCode::CREATED)
        }
        Err(signup_error) => {
            warn!("Signup failed: {:?}", signup_error.to_code());
            let status = match signup_error {
                SignupError::UsernameTaken | SignupError::EmailTaken => StatusCode::CONFLICT,
                SignupError::DatabaseError | SignupError::InternalError => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_REQUEST,
            };
            deliver_signup_response(signup_error.to_response(), status)
        }
    }
}

/// Parse signup fields from a JSON or form-urlencoded body
async fn parse_signup_body(
    req: Request<hyper::body::Incoming>,
) -> std::result::Result<SignupData, SignupError> {
    let bytes = body::collect_body(req)
        .await
        .map_err(|_| SignupError::InternalError)?;

    if body::looks_like_json(&bytes) {
        return serde_json::from_slice::<SignupData>(&bytes)
            .map_err(|_| SignupError::InvalidBody);
    }

    let params = body::form_params(&bytes);

    let username = params
        .get("username")
        .ok_or(SignupError::MissingField("username".to_string()))?
        .trim()
        .to_string();

    let email = params
        .get("email")
        .ok_or(SignupError::MissingField("email".to_string()))?
        .trim()
        .to_string();

    let password = params
        .get("password")
        .ok_or(SignupError::MissingField("password".to_string()))?
        .to_string();

    let first_name = params.get("first_name").cloned().unwrap_or_default();
    let last_name = params.get("last_name").cloned().unwrap_or_default();

    Ok(SignupData {
        username,
        email,
        password,
        first_name,
        last_name,
    })
}

/// Validate signup data
fn validate_signup(data: &SignupData) -> std::result::Result<(), SignupError> {
    if data.username.is_empty() {
        return Err(SignupError::MissingField("username".to_string()));
    }
    if data.email.is_empty() {
        return Err(SignupError::MissingField("email".to_string()));
    }
    if data.password.is_empty() {
        return Err(SignupError::MissingField("password".to_string()));
    }

    if !db_utils::is_valid_username(&data.username) {
        return Err(SignupError::InvalidUsername);
    }
    if !db_utils::is_valid_email(&data.email) {
        return Err(SignupError::InvalidEmail);
    }
    if !db_utils::is_strong_password(&data.password) {
        return Err(SignupError::InvalidPassword);
    }

    Ok(())
}

/// Create the account. New users always start with the 'user' role.
async fn attempt_signup(
    data: &SignupData,
    state: &AppState,
) -> std::result::Result<SignupResponse, SignupError> {
    if db_users::username_exists(&state.db, &data.username)
        .await
        .map_err(|e| {
            error!("Database error checking username: {}", e);
            SignupError::DatabaseError
        })?
    {
        return Err(SignupError::UsernameTaken);
    }

    if db_users::email_exists(&state.db, &data.email)
        .await
        .map_err(|e| {
            error!("Database error checking email: {}", e);
            SignupError::DatabaseError
        })?
    {
        return Err(SignupError::EmailTaken);
    }

    let password_hash = db_utils::hash_password(&data.password).map_err(|e| {
        error!("Password hashing failed: {}", e);
        SignupError::InternalError
    })?;

    let user = db_users::create_user(
        &state.db,
        db_users::NewUser {
            username: data.username.clone(),
            email: data.email.clone(),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            password_hash,
        },
    )
    .await
    .map_err(|e| {
        error!("Failed to create user: {}", e);
        SignupError::DatabaseError
    })?;

    Ok(SignupResponse::Success {
        message: "Account created".to_string(),
        user,
    })
}

/// Deliver a signup response envelope
fn deliver_signup_response(
    response: SignupResponse,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    json_response::deliver_serialized_json(&response, status)
}
