use serde::{Deserialize, Serialize};

use crate::types::user::UserPublic;

/// Signup request data (supports both form-encoded and JSON bodies)
#[derive(Debug, Clone, Deserialize)]
pub struct SignupData {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Signup response codes
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignupResponse {
    Success {
        message: String,
        user: UserPublic,
    },
    Error {
        code: String,
        message: String,
    },
}

/// Error codes for signup
pub enum SignupError {
    UsernameTaken,
    EmailTaken,
    InvalidUsername,
    InvalidPassword,
    InvalidEmail,
    MissingField(String),
    /// Body could not be parsed at all (syntax or type error).
    InvalidBody,
    DatabaseError,
    InternalError,
}

impl SignupError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::InvalidUsername => "INVALID_USERNAME",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidBody => "INVALID_BODY",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::UsernameTaken => "Username is already taken".to_string(),
            Self::EmailTaken => "User already exists with this email".to_string(),
            Self::InvalidUsername => {
                "Username must be 3-32 characters, alphanumeric, underscores, or hyphens only"
                    .to_string()
            }
            Self::InvalidPassword => {
                "Password must be 8-128 characters with at least one letter and one number"
                    .to_string()
            }
            Self::InvalidEmail => "Invalid email format".to_string(),
            Self::MissingField(field) => format!("Missing required field: {}", field),
            Self::InvalidBody => "Request body could not be parsed".to_string(),
            Self::DatabaseError => "Database error occurred".to_string(),
            Self::InternalError => "An internal error occurred".to_string(),
        }
    }

    pub fn to_response(&self) -> SignupResponse {
        SignupResponse::Error {
            code: self.to_code().to_string(),
            message: self.to_message(),
        }
    }
}
