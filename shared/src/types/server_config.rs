use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// sqlx connection string, e.g. `"sqlite://catalogue.db?mode=rwc"`.
    #[serde(default = "default_database_url")]
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Access tokens are short-lived; they carry the role claim and gate
    /// every regular API call.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_minutes: u64,

    /// Refresh tokens are long-lived, carry no role, and are accepted only
    /// by the refresh endpoint.
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_days: u64,

    /// HMAC algorithm used to sign tokens. Only the HS* family is supported.
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,

    /// HMAC key used to sign and verify JWTs.
    ///
    /// Prefer loading this via the `JWT_SECRET` environment variable.  This
    /// config field is the fallback for deployments that cannot inject env
    /// vars at runtime (e.g. certain container setups).
    ///
    /// **Minimum length:** 32 characters.
    /// **Hot-reload safe:** NO — the server reads this once at startup and
    /// hands it to the token issuer.  Rotating the secret invalidates every
    /// outstanding token and requires a restart.
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ServerConfig {
    /// Full bind address, e.g. `"0.0.0.0:8000"`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl AuthConfig {
    /// Access-token expiry converted to seconds.
    pub fn access_token_expiry_secs(&self) -> u64 {
        self.access_token_expiry_minutes * 60
    }

    /// Refresh-token expiry converted to seconds.
    pub fn refresh_token_expiry_secs(&self) -> u64 {
        self.refresh_token_expiry_days * 24 * 60 * 60
    }

    /// Resolve the JWT secret with `JWT_SECRET` env-var taking priority over
    /// the config file field.
    ///
    /// Returns `None` when neither source is set (the server startup code
    /// treats this as a hard error).
    pub fn resolved_jwt_secret(&self) -> Option<String> {
        std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.jwt_secret.clone())
            .filter(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_port() -> u16 {
    8000
}

pub fn default_max_connections() -> usize {
    1000
}

pub fn default_database_url() -> String {
    "sqlite://catalogue.db?mode=rwc".to_string()
}

pub fn default_access_token_expiry() -> u64 {
    60
}

pub fn default_refresh_token_expiry() -> u64 {
    2
}

pub fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> &'static str {
        r#"
            [server]
            bind = "127.0.0.1"

            [database]

            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"
        "#
    }

    #[test]
    fn defaults_fill_in_missing_fields() {
        let cfg: AppConfig = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.server.max_connections, 1000);
        assert_eq!(cfg.auth.access_token_expiry_minutes, 60);
        assert_eq!(cfg.auth.refresh_token_expiry_days, 2);
        assert_eq!(cfg.auth.jwt_algorithm, "HS256");
    }

    #[test]
    fn expiry_helpers_convert_units() {
        let cfg: AppConfig = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(cfg.auth.access_token_expiry_secs(), 3600);
        assert_eq!(cfg.auth.refresh_token_expiry_secs(), 2 * 86_400);
    }

    #[test]
    fn addr_joins_bind_and_port() {
        let cfg: AppConfig = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(cfg.server.addr(), "127.0.0.1:8000");
    }
}
