//! Request gates: bearer validation and role authorization.
//!
//! Both gates take their collaborators as parameters (issuer, blocklist)
//! rather than reaching for globals, so tests can drive them with fakes.

use hyper::header::HeaderMap;
use tracing::{debug, warn};

use crate::auth::blocklist::TokenBlocklist;
use crate::auth::error::AuthError;
use crate::auth::issuer::TokenIssuer;
use shared::types::jwt::TokenClaims;

/// Which flavour of token an endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Regular API calls — role-carrying, short-lived.
    Access,
    /// The refresh endpoint only.
    Refresh,
}

impl TokenKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Extract a bearer token from the `Authorization` header.
/// Format: `Authorization: Bearer <token>`
pub fn get_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| {
            auth.strip_prefix("Bearer ").map(|t| {
                debug!("Bearer token extracted");
                t.trim().to_string()
            })
        })
}

// ---------------------------------------------------------------------------
// Bearer gate
// ---------------------------------------------------------------------------

/// Per-request validation pipeline: extract → decode → revocation check →
/// kind check. Terminal outcome is either the decoded claims or a typed
/// rejection; nothing is mutated (logout revokes separately, after the gate
/// has accepted).
#[derive(Debug, Clone, Copy)]
pub struct BearerGate {
    kind: TokenKind,
}

impl BearerGate {
    pub fn access() -> Self {
        Self {
            kind: TokenKind::Access,
        }
    }

    pub fn refresh() -> Self {
        Self {
            kind: TokenKind::Refresh,
        }
    }

    pub async fn validate(
        &self,
        headers: &HeaderMap,
        issuer: &TokenIssuer,
        blocklist: &dyn TokenBlocklist,
    ) -> Result<TokenClaims, AuthError> {
        let token = get_bearer_token(headers).ok_or(AuthError::MissingToken)?;

        // Signature + expiry. Decode failures collapse to one rejection.
        let claims = issuer.decode(&token)?;

        // Revocation is checked before the kind so a logged-out token is
        // reported as revoked no matter where it is presented.
        let revoked = blocklist
            .is_revoked(&claims.jti)
            .await
            .map_err(|e| AuthError::Backend(format!("blocklist lookup failed: {}", e)))?;
        if revoked {
            warn!("Rejected revoked token, jti={}", claims.jti);
            return Err(AuthError::TokenRevoked);
        }

        let presented = if claims.refresh {
            TokenKind::Refresh
        } else {
            TokenKind::Access
        };
        if presented != self.kind {
            return Err(AuthError::WrongTokenKind {
                expected: self.kind.name(),
            });
        }

        Ok(claims)
    }
}

// ---------------------------------------------------------------------------
// Role gate
// ---------------------------------------------------------------------------

/// Immutable allow-list of role names, fixed per protected operation when
/// the router is built.
#[derive(Debug, Clone)]
pub struct RoleChecker {
    allowed: &'static [&'static str],
}

impl RoleChecker {
    pub fn new(allowed: &'static [&'static str]) -> Self {
        Self { allowed }
    }

    /// Accept iff the validated claims carry a role on the allow-list.
    /// Claims without a role (refresh tokens) are always rejected here —
    /// they cannot authorise role-gated actions.
    pub fn check(&self, claims: &TokenClaims) -> Result<(), AuthError> {
        match claims.user.role.as_deref() {
            Some(role) if self.allowed.contains(&role) => Ok(()),
            _ => Err(AuthError::InsufficientRole),
        }
    }
}
