//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables (nested keys
//! use the `__` separator, e.g. `SESSION__TOKEN_SECRET`).

use serde::Deserialize;

/// Server configuration composed from section configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Session token configuration.
    pub session: SessionConfig,

    /// Google OIDC configuration.
    pub google: GoogleOidcConfig,

    /// Authorization gate configuration.
    #[serde(default)]
    pub gate: GateConfig,

    /// Domain whitelist configuration.
    #[serde(default)]
    pub whitelist: WhitelistConfig,
}

/// Session token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret used to sign session tokens (HS256).
    pub token_secret: String,

    /// Session token lifetime in minutes.
    ///
    /// There is no server-side revocation: a role downgrade or account
    /// deactivation only takes effect once existing tokens expire, so this
    /// value bounds that staleness window. Defaults to 30 days.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP
    /// development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_session_duration_minutes() -> i64 {
    43_200
}

fn default_secure_cookies() -> bool {
    true
}

/// Google OIDC configuration.
///
/// Google is the only supported identity provider; the issuer is fixed
/// unless overridden for testing against a stand-in provider.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleOidcConfig {
    /// The OIDC issuer URL, used for discovery.
    #[serde(default = "default_issuer_url")]
    pub issuer_url: String,
    /// The OAuth2 client ID registered with Google.
    pub client_id: String,
    /// The OAuth2 client secret.
    pub client_secret: String,
    /// The redirect URI for the OAuth2 callback.
    pub redirect_uri: String,
    /// OAuth2 scopes to request as a comma-separated string.
    #[serde(default = "default_scopes")]
    pub scopes: String,
}

fn default_issuer_url() -> String {
    "https://accounts.google.com".to_string()
}

fn default_scopes() -> String {
    "openid,email,profile".to_string()
}

impl GoogleOidcConfig {
    /// Returns the OAuth2 scopes, parsed from the comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes.split(',').map(str::trim).collect()
    }
}

/// Authorization gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Service credentials as a JSON array of
    /// `{key, name, route_classes, origins}` objects.
    #[serde(default = "default_credentials")]
    pub credentials: String,

    /// Whether an origin mismatch is a hard deny.
    ///
    /// Off by default: mismatches are logged but allowed. An absent origin
    /// is never a failure in either mode.
    #[serde(default)]
    pub strict_origin: bool,
}

fn default_credentials() -> String {
    "[]".to_string()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            credentials: default_credentials(),
            strict_origin: false,
        }
    }
}

/// Domain whitelist configuration.
///
/// The static list is unioned with the persisted `allowed_domains` table;
/// neither source supersedes the other.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhitelistConfig {
    /// Comma-separated list of always-allowed email domains.
    #[serde(default)]
    pub static_domains: String,
}

impl WhitelistConfig {
    /// Returns the static domains, parsed from the comma-separated string.
    #[must_use]
    pub fn domains(&self) -> Vec<String> {
        self.static_domains
            .split(',')
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect()
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
