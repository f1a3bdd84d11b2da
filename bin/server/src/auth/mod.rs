//! Authentication and authorization module for the trailhead server.
//!
//! This module provides:
//! - Google OIDC sign-in (login/callback/logout routes)
//! - Stateless signed session tokens carried in an HTTP-only cookie
//! - The gate middleware applied to every `/api/*` route
//! - Role extractors for endpoint minimum-role declarations
//!
//! # Authorization Model
//!
//! Two independent axes gate every request:
//! - The service API key maps to route classes (internal/external) and
//!   allowed origins, checked by the gate middleware.
//! - On internal routes, the session token's embedded role is checked
//!   against the endpoint's declared minimum.
//!
//! Session-embedded roles mean role changes take effect when a new token is
//! minted (next sign-in), not immediately; the configured token lifetime
//! bounds that window. Sign-in itself is gated by the email-domain
//! whitelist, and a brand-new account starts at the Pending role: signed in,
//! but authorized for no internal endpoint until promoted.

pub mod google;
pub mod middleware;
pub mod routes;
pub mod token;

pub use google::GoogleOidcClient;
pub use middleware::{Identity, RequireAdmin, RequireManager, RequireReadOnly, RequireStaff};
pub use routes::{callback, login, logout};
pub use token::SessionTokenService;

use sqlx::PgPool;
use trailhead_access::{AuthorizationGate, SignInController};

use crate::config::SessionConfig;

/// Session cookie name.
pub(crate) const SESSION_COOKIE: &str = "session";

/// Shared application state.
pub struct AppState {
    /// Database connection pool.
    pub db_pool: PgPool,
    /// OIDC client for authentication.
    pub oidc_client: GoogleOidcClient,
    /// Session token service.
    pub tokens: SessionTokenService,
    /// The per-request authorization gate.
    pub gate: AuthorizationGate,
    /// The account lifecycle controller.
    pub controller: SignInController,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        db_pool: PgPool,
        oidc_client: GoogleOidcClient,
        tokens: SessionTokenService,
        gate: AuthorizationGate,
        controller: SignInController,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            db_pool,
            oidc_client,
            tokens,
            gate,
            controller,
            session_config,
        }
    }
}
