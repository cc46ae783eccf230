use serde::{Deserialize, Serialize};

/// Subject summary embedded inside every token.
///
/// `role` is present on access tokens and deliberately absent on refresh
/// tokens: a refresh token can only be exchanged for a new access token, it
/// must never authorise a role-gated action directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUser {
    /// Email of the authenticated account.
    pub email: String,

    /// UUID of the account (matches `users.id`).
    pub user_id: String,

    /// Role name (`"user"` or `"admin"`). `None` on refresh tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Claims embedded in every JWT issued by the server.
///
/// # Verification path
/// Decode the JWT and verify the HMAC signature and expiry, then look up
/// `jti` in the revocation blocklist. A token is valid iff the signature
/// verifies, `exp` is in the future, `jti` is not blocklisted, and its
/// `refresh` flag matches what the consuming endpoint expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject summary — who this token authenticates.
    pub user: TokenUser,

    /// Unique token id (UUID v4, fresh per issuance).
    /// This is the revocation handle: writing it to the blocklist
    /// invalidates the token even before its `exp` is reached.
    pub jti: String,

    /// `true` for refresh tokens, `false` for access tokens.
    /// The refresh endpoint accepts only `true`; every other protected
    /// endpoint accepts only `false`.
    pub refresh: bool,

    /// Standard JWT expiry (Unix timestamp, seconds).
    pub exp: usize,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: usize,
}

impl TokenClaims {
    /// Seconds of validity this token has left, zero if already expired.
    pub fn remaining_secs(&self, now: i64) -> u64 {
        (self.exp as i64).saturating_sub(now).max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access_claims() -> TokenClaims {
        TokenClaims {
            user: TokenUser {
                email: "a@x.com".to_string(),
                user_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
                role: Some("user".to_string()),
            },
            jti: "11111111-2222-3333-4444-555555555555".to_string(),
            refresh: false,
            exp: 1_700_003_600,
            iat: 1_700_000_000,
        }
    }

    #[test]
    fn role_is_omitted_from_json_when_none() {
        let mut claims = access_claims();
        claims.user.role = None;
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json["user"].get("role").is_none());
    }

    #[test]
    fn role_is_present_in_json_when_set() {
        let json = serde_json::to_value(&access_claims()).unwrap();
        assert_eq!(json["user"]["role"], "user");
    }

    #[test]
    fn remaining_secs_counts_down_and_floors_at_zero() {
        let claims = access_claims();
        assert_eq!(claims.remaining_secs(1_700_000_000), 3600);
        assert_eq!(claims.remaining_secs(1_700_003_600), 0);
        assert_eq!(claims.remaining_secs(1_700_009_999), 0);
    }
}
