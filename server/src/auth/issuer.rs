//! Builds signed tokens for authenticated users.

use jsonwebtoken::Algorithm;

use crate::auth::codec;
use crate::auth::error::AuthError;
use crate::database::utils::{generate_uuid_token, get_timestamp};
use shared::types::jwt::{TokenClaims, TokenUser};

/// Identity subset the issuer needs — the caller has already authenticated
/// it (password check at login, refresh-token check at refresh).
#[derive(Debug, Clone)]
pub struct Subject {
    pub email: String,
    pub user_id: String,
    pub role: String,
}

/// Owns the signing key, algorithm and configured lifetimes.
///
/// Built once at startup from the validated config and shared via
/// `AppState`; issuance and decoding never re-read the config.
pub struct TokenIssuer {
    secret: String,
    algorithm: Algorithm,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl TokenIssuer {
    pub fn new(
        secret: String,
        algorithm: Algorithm,
        access_ttl_secs: u64,
        refresh_ttl_secs: u64,
    ) -> Self {
        Self {
            secret,
            algorithm,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Short-lived token carrying the role claim. Gates every regular API
    /// call.
    pub fn issue_access_token(&self, subject: &Subject) -> Result<String, AuthError> {
        let claims = self.build_claims(subject, Some(subject.role.clone()), false);
        codec::encode_token(&claims, &self.secret, self.algorithm)
    }

    /// Long-lived token with the role deliberately omitted — a refresh token
    /// must never authorise a role-gated action, only a token exchange.
    pub fn issue_refresh_token(&self, subject: &Subject) -> Result<String, AuthError> {
        let claims = self.build_claims(subject, None, true);
        codec::encode_token(&claims, &self.secret, self.algorithm)
    }

    /// Verify and decode a token issued by this server.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        codec::decode_token(token, &self.secret, self.algorithm)
    }

    pub fn access_ttl_secs(&self) -> u64 {
        self.access_ttl_secs
    }

    fn build_claims(&self, subject: &Subject, role: Option<String>, refresh: bool) -> TokenClaims {
        let now = get_timestamp();
        let ttl = if refresh {
            self.refresh_ttl_secs
        } else {
            self.access_ttl_secs
        };

        TokenClaims {
            user: TokenUser {
                email: subject.email.clone(),
                user_id: subject.user_id.clone(),
                role,
            },
            // Fresh per issuance — the revocation handle must be unique even
            // for back-to-back logins of the same account.
            jti: generate_uuid_token(),
            refresh,
            exp: (now as u64 + ttl) as usize,
            iat: now as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET.to_string(), Algorithm::HS256, 3600, 2 * 86_400)
    }

    fn subject() -> Subject {
        Subject {
            email: "a@x.com".to_string(),
            user_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            role: "user".to_string(),
        }
    }

    #[test]
    fn access_token_carries_role_and_access_kind() {
        let iss = issuer();
        let token = iss.issue_access_token(&subject()).unwrap();
        let claims = iss.decode(&token).unwrap();
        assert_eq!(claims.user.role.as_deref(), Some("user"));
        assert!(!claims.refresh);
        assert_eq!(claims.user.email, "a@x.com");
    }

    #[test]
    fn refresh_token_omits_role() {
        let iss = issuer();
        let token = iss.issue_refresh_token(&subject()).unwrap();
        let claims = iss.decode(&token).unwrap();
        assert!(claims.user.role.is_none());
        assert!(claims.refresh);
    }

    #[test]
    fn each_issuance_gets_a_fresh_jti() {
        let iss = issuer();
        let s = subject();
        let a = iss.decode(&iss.issue_access_token(&s).unwrap()).unwrap();
        let b = iss.decode(&iss.issue_access_token(&s).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn lifetimes_follow_configuration() {
        let iss = issuer();
        let s = subject();
        let access = iss.decode(&iss.issue_access_token(&s).unwrap()).unwrap();
        let refresh = iss.decode(&iss.issue_refresh_token(&s).unwrap()).unwrap();
        assert_eq!(access.exp - access.iat, 3600);
        assert_eq!(refresh.exp - refresh.iat, 2 * 86_400);
    }
}
