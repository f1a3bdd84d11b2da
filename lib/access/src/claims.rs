//! Session claims carried by signed session tokens.
//!
//! Claims are derived from the account at token-issuance time and carried
//! opaquely afterward; the gate trusts the embedded role and domain without
//! re-querying the store. The staleness window this opens is bounded by the
//! configured token lifetime.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use trailhead_core::AccountId;

use crate::role::Role;

/// The trusted payload of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    subject: AccountId,
    role: Role,
    domain: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionClaims {
    /// Creates claims for a freshly-read account, valid for `lifetime`.
    #[must_use]
    pub fn new(subject: AccountId, role: Role, domain: String, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            subject,
            role,
            domain,
            issued_at: now,
            expires_at: now + lifetime,
        }
    }

    /// Reconstitutes claims from a verified token payload.
    #[must_use]
    pub fn with_all_fields(
        subject: AccountId,
        role: Role,
        domain: String,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject,
            role,
            domain,
            issued_at,
            expires_at,
        }
    }

    /// Returns the account the claims were issued for.
    #[must_use]
    pub fn subject(&self) -> AccountId {
        self.subject
    }

    /// Returns the role captured at issuance time.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the account's email domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns when the claims were issued.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns when the claims expire.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the claims have expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// The session evidence a request presents to the gate.
///
/// The token layer classifies the raw cookie before the gate runs; the gate
/// only orders the outcome against its other checks.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No session token was presented.
    Missing,
    /// A token was presented but failed verification.
    Invalid,
    /// A token was presented and verified, but has expired.
    Expired,
    /// A verified, unexpired token carrying these claims.
    Authenticated(SessionClaims),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_claims_expire_after_lifetime() {
        let claims = SessionClaims::new(
            AccountId::new(),
            Role::Staff,
            "example.com".to_string(),
            Duration::hours(1),
        );

        assert!(!claims.is_expired());
        assert!(claims.expires_at() > claims.issued_at());
        assert_eq!(claims.role(), Role::Staff);
        assert_eq!(claims.domain(), "example.com");
    }

    #[test]
    fn negative_lifetime_is_already_expired() {
        let claims = SessionClaims::new(
            AccountId::new(),
            Role::User,
            "example.com".to_string(),
            Duration::seconds(-1),
        );

        assert!(claims.is_expired());
    }

    #[test]
    fn claims_serde_roundtrip() {
        let claims = SessionClaims::new(
            AccountId::new(),
            Role::Admin,
            "example.com".to_string(),
            Duration::days(30),
        );

        let json = serde_json::to_string(&claims).expect("serialize");
        let parsed: SessionClaims = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(claims, parsed);
    }
}
