//! Error types for the access crate.
//!
//! Gate denials carry their own `DenyReason` (see `gate`); this module
//! covers the sign-in lifecycle, where a rejection is an outcome of the
//! state machine rather than a request-check failure.

use std::fmt;

use crate::store::StoreError;

/// Errors from the sign-in lifecycle.
///
/// All variants deny the sign-in cleanly; `StoreUnavailable` is the only
/// one surfaced to callers as a service fault rather than a rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInError {
    /// The verified email is malformed (zero or multiple `@`, empty parts).
    InvalidEmail { email: String },
    /// The identity's domain is not whitelisted; no account was touched.
    DomainNotWhitelisted { domain: String },
    /// The account exists but is deactivated; no fields were updated.
    AccountDeactivated { email: String },
    /// The store failed; the sign-in was aborted with no partial writes.
    StoreUnavailable { details: String },
}

impl fmt::Display for SignInError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail { email } => {
                write!(f, "invalid email address: {email}")
            }
            Self::DomainNotWhitelisted { domain } => {
                write!(f, "domain '{domain}' is not whitelisted")
            }
            Self::AccountDeactivated { email } => {
                write!(f, "account '{email}' is deactivated")
            }
            Self::StoreUnavailable { details } => {
                write!(f, "account store unavailable: {details}")
            }
        }
    }
}

impl std::error::Error for SignInError {}

impl From<StoreError> for SignInError {
    fn from(e: StoreError) -> Self {
        Self::StoreUnavailable {
            details: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_the_rejected_domain() {
        let err = SignInError::DomainNotWhitelisted {
            domain: "evil.example.net".to_string(),
        };
        assert!(err.to_string().contains("evil.example.net"));
    }

    #[test]
    fn store_error_converts_to_store_unavailable() {
        let err: SignInError = StoreError::Unavailable {
            details: "connection refused".to_string(),
        }
        .into();
        assert!(matches!(err, SignInError::StoreUnavailable { .. }));
        assert!(err.to_string().contains("connection refused"));
    }
}
