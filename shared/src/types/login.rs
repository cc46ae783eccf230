use serde::{Deserialize, Serialize};

use crate::types::user::UserSummary;

// ---------------------------------------------------------------------------
// Login wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

/// Successful / failed login response envelope.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginResponse {
    Success {
        message: String,
        /// Short-lived signed JWT carrying the role claim.
        access_token: String,
        /// Long-lived signed JWT accepted only by the refresh endpoint.
        refresh_token: String,
        user: UserSummary,
    },
    Error {
        code: String,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Login errors
// ---------------------------------------------------------------------------

pub enum LoginError {
    /// Wrong email OR wrong password — deliberately indistinguishable so the
    /// response cannot be used to enumerate accounts.
    InvalidCredentials,
    MissingField(String),
    /// Body could not be parsed at all (syntax or type error), as opposed
    /// to a well-formed body with a field missing.
    InvalidBody,
    DatabaseError,
    InternalError,
}

impl LoginError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidBody => "INVALID_BODY",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::MissingField(field) => format!("Missing required field: {}", field),
            Self::InvalidBody => "Request body could not be parsed".to_string(),
            Self::DatabaseError => "Database error occurred".to_string(),
            Self::InternalError => "An internal error occurred".to_string(),
        }
    }

    pub fn to_response(&self) -> LoginResponse {
        LoginResponse::Error {
            code: self.to_code().to_string(),
            message: self.to_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_data_deserializes_from_json() {
        let json = r#"{"email":"a@x.com","password":"pass1234"}"#;
        let d: LoginData = serde_json::from_str(json).unwrap();
        assert_eq!(d.email, "a@x.com");
        assert_eq!(d.password, "pass1234");
    }

    #[test]
    fn invalid_credentials_message_never_names_the_field() {
        // Account-enumeration guard: the same code and message regardless of
        // whether the email exists or the password was wrong.
        let msg = LoginError::InvalidCredentials.to_message();
        assert!(!msg.to_lowercase().contains("not found"));
        assert_eq!(msg, "Invalid email or password");
    }
}
