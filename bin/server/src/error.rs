//! API error types and their JSON envelopes.
//!
//! Two envelope shapes are part of the external contract:
//! - credential-level failures carry `{"success":false,"error":...,"code":...}`
//! - session/role failures carry `{"success":false,"message":...}`
//!
//! Store faults are surfaced as a generic service-unavailable envelope; the
//! typed reason stays in internal logs only.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use trailhead_access::{DenyReason, Role, StoreError};

/// Errors returned by API handlers and middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Credential-level rejection (missing/invalid key, route class,
    /// origin).
    Unauthorized { message: String },
    /// Session-level rejection on an internal route.
    AuthenticationRequired,
    /// The session role does not meet the endpoint minimum.
    RoleRequired { required: Role },
    /// Malformed request input.
    BadRequest { message: String },
    /// The addressed resource does not exist.
    NotFound { message: String },
    /// A unique constraint rejected the write.
    Conflict { message: String },
    /// The store (or another dependency) is unavailable.
    ServiceUnavailable,
    /// Server-side invariant violation.
    Internal { message: String },
}

impl ApiError {
    /// Convenience constructor for bad-request errors.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Convenience constructor for not-found errors.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Convenience constructor for internal errors.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Envelope for credential-level and resource errors.
#[derive(Debug, Serialize)]
struct CodedErrorBody {
    success: bool,
    error: String,
    code: &'static str,
}

/// Envelope for session- and role-level errors.
#[derive(Debug, Serialize)]
struct MessageErrorBody {
    success: bool,
    message: String,
}

fn coded(status: StatusCode, error: String, code: &'static str) -> Response {
    (
        status,
        Json(CodedErrorBody {
            success: false,
            error,
            code,
        }),
    )
        .into_response()
}

fn message(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(MessageErrorBody {
            success: false,
            message,
        }),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized { message: m } => {
                coded(StatusCode::UNAUTHORIZED, m, "UNAUTHORIZED")
            }
            Self::AuthenticationRequired => message(
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            Self::RoleRequired { required } => message(
                StatusCode::FORBIDDEN,
                format!("{} access required", required.display_name()),
            ),
            Self::BadRequest { message: m } => coded(StatusCode::BAD_REQUEST, m, "BAD_REQUEST"),
            Self::NotFound { message: m } => coded(StatusCode::NOT_FOUND, m, "NOT_FOUND"),
            Self::Conflict { message: m } => coded(StatusCode::CONFLICT, m, "CONFLICT"),
            Self::ServiceUnavailable => coded(
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
                "SERVICE_UNAVAILABLE",
            ),
            Self::Internal { message: m } => {
                tracing::error!(message = %m, "internal server error");
                coded(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        }
    }
}

impl From<DenyReason> for ApiError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::MissingCredential => Self::Unauthorized {
                message: "API key required".to_string(),
            },
            DenyReason::InvalidCredential => Self::Unauthorized {
                message: "Invalid API key".to_string(),
            },
            DenyReason::RouteClassDenied => Self::Unauthorized {
                message: "API key not valid for this route".to_string(),
            },
            DenyReason::OriginDenied => Self::Unauthorized {
                message: "Origin not allowed for this API key".to_string(),
            },
            DenyReason::SessionMissing | DenyReason::SessionExpired => {
                Self::AuthenticationRequired
            }
            DenyReason::RoleInsufficient { required, .. } => Self::RoleRequired { required },
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => Self::Conflict {
                message: "Resource already exists".to_string(),
            },
            StoreError::Unavailable { details } => {
                tracing::error!(details = %details, "store unavailable");
                Self::ServiceUnavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_map_to_the_coded_envelope() {
        let err: ApiError = DenyReason::MissingCredential.into();
        assert_eq!(
            err,
            ApiError::Unauthorized {
                message: "API key required".to_string(),
            }
        );
    }

    #[test]
    fn origin_denial_uses_the_contract_error_text() {
        let err: ApiError = DenyReason::OriginDenied.into();
        assert_eq!(
            err,
            ApiError::Unauthorized {
                message: "Origin not allowed for this API key".to_string(),
            }
        );
    }

    #[test]
    fn session_failures_collapse_to_authentication_required() {
        assert_eq!(
            ApiError::from(DenyReason::SessionMissing),
            ApiError::AuthenticationRequired
        );
        assert_eq!(
            ApiError::from(DenyReason::SessionExpired),
            ApiError::AuthenticationRequired
        );
    }

    #[test]
    fn role_denial_carries_the_required_role() {
        let err: ApiError = DenyReason::RoleInsufficient {
            required: Role::Admin,
            actual: Role::Staff,
        }
        .into();
        assert_eq!(
            err,
            ApiError::RoleRequired {
                required: Role::Admin,
            }
        );
    }

    #[test]
    fn store_outage_is_not_distinguished_to_callers() {
        let err: ApiError = StoreError::Unavailable {
            details: "connection refused".to_string(),
        }
        .into();
        assert_eq!(err, ApiError::ServiceUnavailable);
    }

    #[test]
    fn coded_envelope_serializes_the_contract_shape() {
        let body = CodedErrorBody {
            success: false,
            error: "Invalid API key".to_string(),
            code: "UNAUTHORIZED",
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "error": "Invalid API key",
                "code": "UNAUTHORIZED",
            })
        );
    }

    #[test]
    fn message_envelope_serializes_the_contract_shape() {
        let body = MessageErrorBody {
            success: false,
            message: "Authentication required".to_string(),
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "message": "Authentication required",
            })
        );
    }
}
