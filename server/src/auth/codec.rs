//! Pure encode/decode over signed claims.
//!
//! Both functions are side-effect-free: same inputs, same outputs (the
//! issuer, not the codec, is responsible for minting fresh jti values).
//! Decode collapses every jsonwebtoken failure — malformed input, signature
//! mismatch, algorithm mismatch, expired timestamp — into
//! [`AuthError::InvalidToken`] so callers cannot branch on the reason.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use crate::auth::error::AuthError;
use shared::types::jwt::TokenClaims;

/// Serialize and sign a claim set.
pub fn encode_token(
    claims: &TokenClaims,
    secret: &str,
    algorithm: Algorithm,
) -> Result<String, AuthError> {
    jsonwebtoken::encode(
        &Header::new(algorithm),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Backend(format!("token encoding failed: {}", e)))
}

/// Verify signature + structural validity + expiry, returning the claims.
pub fn decode_token(
    token: &str,
    secret: &str,
    algorithm: Algorithm,
) -> Result<TokenClaims, AuthError> {
    // Expiry is a hard edge: jsonwebtoken's default 60s leeway would let a
    // token outlive its exp claim, so it is switched off.
    let mut validation = Validation::new(algorithm);
    validation.leeway = 0;

    jsonwebtoken::decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("Token decode rejected: {}", e);
        AuthError::InvalidToken
    })
}

/// Parse the configured algorithm name. Only the symmetric HS family is
/// accepted; config validation enforces this earlier, but startup re-checks.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, AuthError> {
    match name {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(AuthError::Backend(format!(
            "unsupported signing algorithm: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::utils::get_timestamp;
    use shared::types::jwt::TokenUser;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn claims_expiring_in(secs: i64) -> TokenClaims {
        let now = get_timestamp();
        TokenClaims {
            user: TokenUser {
                email: "a@x.com".to_string(),
                user_id: "u-1".to_string(),
                role: Some("user".to_string()),
            },
            jti: "jti-1".to_string(),
            refresh: false,
            exp: (now + secs) as usize,
            iat: now as usize,
        }
    }

    #[test]
    fn roundtrip_recovers_claims() {
        let claims = claims_expiring_in(3600);
        let token = encode_token(&claims, SECRET, Algorithm::HS256).unwrap();
        let back = decode_token(&token, SECRET, Algorithm::HS256).unwrap();
        assert_eq!(back.user.email, "a@x.com");
        assert_eq!(back.user.role.as_deref(), Some("user"));
        assert_eq!(back.jti, "jti-1");
        assert!(!back.refresh);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = claims_expiring_in(3600);
        let token = encode_token(&claims, SECRET, Algorithm::HS256).unwrap();
        let err = decode_token(&token, "another-secret-another-secret-xx", Algorithm::HS256)
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[test]
    fn wrong_algorithm_is_rejected() {
        let claims = claims_expiring_in(3600);
        let token = encode_token(&claims, SECRET, Algorithm::HS256).unwrap();
        let err = decode_token(&token, SECRET, Algorithm::HS384).unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = claims_expiring_in(-120);
        let token = encode_token(&claims, SECRET, Algorithm::HS256).unwrap();
        let err = decode_token(&token, SECRET, Algorithm::HS256).unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[test]
    fn barely_expired_token_is_rejected() {
        // No leeway: a token a few seconds past exp is already invalid.
        let claims = claims_expiring_in(-3);
        let token = encode_token(&claims, SECRET, Algorithm::HS256).unwrap();
        let err = decode_token(&token, SECRET, Algorithm::HS256).unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[test]
    fn garbage_input_is_rejected() {
        assert_eq!(
            decode_token("not-a-token", SECRET, Algorithm::HS256).unwrap_err(),
            AuthError::InvalidToken
        );
        assert_eq!(
            decode_token("", SECRET, Algorithm::HS256).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn algorithm_names_parse() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("HS512").unwrap(), Algorithm::HS512);
        assert!(parse_algorithm("RS256").is_err());
        assert!(parse_algorithm("none").is_err());
    }
}
