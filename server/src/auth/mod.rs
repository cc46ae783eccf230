//! Token lifecycle and authorization core.
//!
//! Four pieces, wired together by the router:
//!
//!   codec     — pure encode/decode of signed claims (jsonwebtoken)
//!   issuer    — builds access tokens (short, role-carrying) and refresh
//!               tokens (long, role-free) for an authenticated user
//!   blocklist — revoked-jti store consulted on every protected request
//!   gate      — bearer extraction + decode + revocation + kind check,
//!               followed by the role allow-list check
//!
//! The router runs the gates before any handler sees the request; handlers
//! receive decoded claims and never re-check auth themselves.

pub mod blocklist;
pub mod codec;
pub mod error;
pub mod gate;
pub mod issuer;

pub use self::blocklist::{MemoryBlocklist, SqliteBlocklist, TokenBlocklist};
pub use self::error::AuthError;
pub use self::gate::{BearerGate, RoleChecker, TokenKind};
pub use self::issuer::TokenIssuer;
