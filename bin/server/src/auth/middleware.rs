//! Gate middleware and role extractors for Axum.
//!
//! Every `/api/*` route passes through a gate middleware for its route
//! class. The middleware assembles the request evidence (API key, origin,
//! session cookie), runs the authorization gate, and on success stores the
//! verified session claims in the request extensions for the role
//! extractors to consume.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use trailhead_access::{
    GateDecision, GateRequest, Role, RouteClass, SessionClaims, SessionState,
};

use super::{AppState, SESSION_COOKIE};
use crate::error::ApiError;

/// API key header name (lookup is case-insensitive).
const API_KEY_HEADER: &str = "x-api-key";

/// Gate middleware for external (partner) routes.
pub async fn external_gate(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    run_gate(&state, req, next, RouteClass::External).await
}

/// Gate middleware for internal (session-protected) routes.
pub async fn internal_gate(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    run_gate(&state, req, next, RouteClass::Internal).await
}

async fn run_gate(
    state: &AppState,
    mut req: Request,
    next: Next,
    route_class: RouteClass,
) -> Result<Response, ApiError> {
    // Session evidence is only collected for internal routes; external
    // routes never require one.
    let session = match route_class {
        RouteClass::Internal => session_state(state, req.headers()),
        RouteClass::External => SessionState::Missing,
    };

    let api_key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .or_else(|| req.headers().get(header::REFERER))
        .and_then(|v| v.to_str().ok());

    let decision = state.gate.authorize(GateRequest {
        api_key,
        origin,
        route_class,
        session,
        // Endpoint minimums are enforced by the role extractors, which run
        // after this middleware.
        required_role: None,
    });

    match decision {
        GateDecision::Allow { claims, .. } => {
            if let Some(claims) = claims {
                req.extensions_mut().insert(claims);
            }
            Ok(next.run(req).await)
        }
        GateDecision::Deny(reason) => Err(reason.into()),
    }
}

/// Classifies the session cookie into gate evidence.
fn session_state(state: &AppState, headers: &HeaderMap) -> SessionState {
    let jar = CookieJar::from_headers(headers);
    match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.tokens.verify(cookie.value()),
        None => SessionState::Missing,
    }
}

/// Extractor for the authenticated caller's claims, without a role floor.
///
/// Only available on internal routes, after the gate middleware has run.
pub struct Identity(pub SessionClaims);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<SessionClaims>().ok_or_else(|| {
            ApiError::internal("session claims missing from request extensions")
        })?;
        Ok(Self(claims.clone()))
    }
}

/// Macro to generate a minimum-role extractor.
macro_rules! define_role_extractor {
    ($(#[$meta:meta])* $name:ident, $role:expr) => {
        $(#[$meta])*
        pub struct $name(pub SessionClaims);

        impl<S> FromRequestParts<S> for $name
        where
            S: Send + Sync,
        {
            type Rejection = ApiError;

            async fn from_request_parts(
                parts: &mut Parts,
                _state: &S,
            ) -> Result<Self, Self::Rejection> {
                let claims = parts.extensions.get::<SessionClaims>().ok_or_else(|| {
                    ApiError::internal("session claims missing from request extensions")
                })?;

                if !claims.role().meets($role) {
                    return Err(ApiError::RoleRequired { required: $role });
                }

                Ok(Self(claims.clone()))
            }
        }
    };
}

define_role_extractor!(
    /// Requires at least the ReadOnly role.
    RequireReadOnly,
    Role::ReadOnly
);

define_role_extractor!(
    /// Requires at least the Staff role.
    RequireStaff,
    Role::Staff
);

define_role_extractor!(
    /// Requires at least the Manager role.
    RequireManager,
    Role::Manager
);

define_role_extractor!(
    /// Requires the Admin role.
    RequireAdmin,
    Role::Admin
);
