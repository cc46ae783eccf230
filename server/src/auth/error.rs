use hyper::StatusCode;
use thiserror::Error;

/// Rejection taxonomy for the auth gates.
///
/// The split that matters is 401 vs 403: everything except
/// `InsufficientRole` means "we don't know who you are — authenticate
/// again", while `InsufficientRole` means "we know exactly who you are and
/// you are not allowed".
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing or malformed Authorization header")]
    MissingToken,

    /// Malformed, tampered, wrongly-signed or expired token. Collapsed into
    /// one variant on purpose — the caller learns nothing about which check
    /// failed.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Wrong token type: expected {expected} token")]
    WrongTokenKind { expected: &'static str },

    #[error("Insufficient privileges")]
    InsufficientRole,

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Blocklist or user lookup failed mid-check. Surfaced as a 500, never
    /// as an auth decision.
    #[error("Auth backend error: {0}")]
    Backend(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "UNAUTHORIZED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::WrongTokenKind { .. } => "WRONG_TOKEN_TYPE",
            Self::InsufficientRole => "FORBIDDEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Backend(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken
            | Self::InvalidToken
            | Self::TokenRevoked
            | Self::WrongTokenKind { .. }
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::InsufficientRole => StatusCode::FORBIDDEN,
            Self::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_and_forbidden_stay_distinct() {
        assert_eq!(AuthError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenRevoked.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InsufficientRole.status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn wrong_kind_names_the_expected_side() {
        let e = AuthError::WrongTokenKind { expected: "access" };
        assert_eq!(e.to_string(), "Wrong token type: expected access token");
        assert_eq!(e.code(), "WRONG_TOKEN_TYPE");
    }
}
