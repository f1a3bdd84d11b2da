//! The per-request authorization gate.
//!
//! The gate composes the credential registry, the presented origin, the
//! session evidence, and the endpoint's minimum role into a single
//! allow/deny decision. Checks short-circuit in a fixed order, so the error
//! a caller sees when several conditions fail simultaneously is always the
//! earliest failing check:
//!
//! 1. API key present
//! 2. API key resolves to a credential
//! 3. Credential allows the route class
//! 4. Origin acceptable (hard deny only in strict mode)
//! 5. External routes: allow
//! 6. Internal routes: session verified and unexpired
//! 7. Internal routes: role meets the endpoint minimum
//!
//! Each request is evaluated independently and statelessly; the only state
//! is the immutable registry plus the token-embedded claims. Every decision
//! emits one structured log line for audit.

use std::sync::Arc;

use crate::claims::{SessionClaims, SessionState};
use crate::credential::{CredentialRegistry, RouteClass};
use crate::role::Role;

/// Everything the gate needs to know about one inbound request.
#[derive(Debug)]
pub struct GateRequest<'a> {
    /// The presented API key, if any.
    pub api_key: Option<&'a str>,
    /// The presented `Origin` (or `Referer` fallback), if any.
    pub origin: Option<&'a str>,
    /// The class of the targeted route.
    pub route_class: RouteClass,
    /// Session evidence, already classified by the token layer.
    pub session: SessionState,
    /// Minimum role the endpoint declares, if any.
    pub required_role: Option<Role>,
}

/// Machine-readable reason a request was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// No API key was presented.
    MissingCredential,
    /// The presented API key is not registered.
    InvalidCredential,
    /// The credential does not cover the targeted route class.
    RouteClassDenied,
    /// The presented origin is not allowed for the credential.
    OriginDenied,
    /// No session token was presented, or it failed verification.
    SessionMissing,
    /// The session token was verified but has expired.
    SessionExpired,
    /// The session role does not meet the endpoint minimum.
    RoleInsufficient { required: Role, actual: Role },
}

impl DenyReason {
    /// Returns the stable reason code used in logs and envelopes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidCredential => "invalid_credential",
            Self::RouteClassDenied => "route_class_denied",
            Self::OriginDenied => "origin_denied",
            Self::SessionMissing => "session_missing",
            Self::SessionExpired => "session_expired",
            Self::RoleInsufficient { .. } => "role_insufficient",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoleInsufficient { required, actual } => {
                write!(
                    f,
                    "role_insufficient (required {required}, actual {actual})"
                )
            }
            other => write!(f, "{}", other.code()),
        }
    }
}

/// Outcome of a gate evaluation.
#[derive(Debug, Clone)]
pub enum GateDecision {
    /// The request may proceed.
    Allow {
        /// Label of the credential that cleared the request.
        credential: String,
        /// Claims of the authenticated caller, for internal routes.
        claims: Option<SessionClaims>,
    },
    /// The request is denied.
    Deny(DenyReason),
}

impl GateDecision {
    /// Returns true if the request was allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

/// The authorization gate.
///
/// Holds the immutable credential registry and the origin strictness flag;
/// shared by reference across request tasks.
pub struct AuthorizationGate {
    registry: Arc<CredentialRegistry>,
    strict_origin: bool,
}

impl AuthorizationGate {
    /// Creates a gate over the given registry.
    ///
    /// With `strict_origin` set, a presented origin that matches no allowed
    /// pattern is a hard deny; otherwise it only logs. An absent origin is
    /// never a failure in either mode.
    #[must_use]
    pub fn new(registry: Arc<CredentialRegistry>, strict_origin: bool) -> Self {
        Self {
            registry,
            strict_origin,
        }
    }

    /// Returns true if origin mismatches hard-deny.
    #[must_use]
    pub fn strict_origin(&self) -> bool {
        self.strict_origin
    }

    /// Evaluates one request against the gate's decision order.
    #[must_use]
    pub fn authorize(&self, request: GateRequest<'_>) -> GateDecision {
        let decision = self.evaluate(&request);

        match &decision {
            GateDecision::Allow { credential, .. } => {
                tracing::info!(
                    allowed = true,
                    credential = %credential,
                    route_class = %request.route_class,
                    "authorization decision"
                );
            }
            GateDecision::Deny(reason) => {
                tracing::info!(
                    allowed = false,
                    reason = %reason,
                    route_class = %request.route_class,
                    "authorization decision"
                );
            }
        }

        decision
    }

    fn evaluate(&self, request: &GateRequest<'_>) -> GateDecision {
        let Some(api_key) = request.api_key else {
            return GateDecision::Deny(DenyReason::MissingCredential);
        };

        let Some(credential) = self.registry.resolve(api_key) else {
            return GateDecision::Deny(DenyReason::InvalidCredential);
        };

        if !credential.allows_route_class(request.route_class) {
            return GateDecision::Deny(DenyReason::RouteClassDenied);
        }

        match request.origin {
            Some(origin) if !credential.origin_allowed(origin) => {
                if self.strict_origin {
                    return GateDecision::Deny(DenyReason::OriginDenied);
                }
                tracing::warn!(
                    credential = credential.name(),
                    origin,
                    "origin not allowed for credential; continuing in non-strict mode"
                );
            }
            Some(_) => {}
            None => {
                tracing::warn!(
                    credential = credential.name(),
                    "request presented no origin header"
                );
            }
        }

        if request.route_class == RouteClass::External {
            return GateDecision::Allow {
                credential: credential.name().to_string(),
                claims: None,
            };
        }

        let claims = match &request.session {
            SessionState::Missing | SessionState::Invalid => {
                return GateDecision::Deny(DenyReason::SessionMissing);
            }
            SessionState::Expired => {
                return GateDecision::Deny(DenyReason::SessionExpired);
            }
            SessionState::Authenticated(claims) => claims,
        };

        if let Some(required) = request.required_role {
            if !claims.role().meets(required) {
                return GateDecision::Deny(DenyReason::RoleInsufficient {
                    required,
                    actual: claims.role(),
                });
            }
        }

        GateDecision::Allow {
            credential: credential.name().to_string(),
            claims: Some(claims.clone()),
        }
    }
}
