//! Signed session tokens.
//!
//! Sessions are stateless: the claims minted at sign-in are signed into an
//! HS256 token and carried by the client. The gate trusts verified claims
//! without a store read, so role changes only take effect when a token is
//! re-minted; the configured lifetime bounds that window. There is no
//! revocation list — logout is client-side token discard.

use chrono::{DateTime, Duration};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use trailhead_access::{Account, Role, SessionClaims, SessionState};
use trailhead_core::AccountId;

/// Wire form of session claims inside the token.
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    /// Subject (account ID).
    sub: String,
    /// Role captured at issuance.
    role: Role,
    /// Account email domain.
    dom: String,
    /// Issued at (Unix timestamp).
    iat: i64,
    /// Expiration time (Unix timestamp).
    exp: i64,
}

/// Error returned when token issuance fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIssueError {
    /// The underlying encoding failure.
    pub details: String,
}

impl fmt::Display for TokenIssueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to issue session token: {}", self.details)
    }
}

impl std::error::Error for TokenIssueError {}

/// Service for issuing and verifying session tokens.
#[derive(Clone)]
pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl SessionTokenService {
    /// Creates a token service signing with the given secret.
    #[must_use]
    pub fn new(secret: &str, lifetime_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::minutes(lifetime_minutes),
        }
    }

    /// Returns the configured token lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues a token for a freshly-read account.
    ///
    /// The embedded role and active state reflect the account at this
    /// moment, never the identity provider's claims.
    pub fn issue(&self, account: &Account) -> Result<String, TokenIssueError> {
        let claims = SessionClaims::new(
            account.id(),
            account.role(),
            account.domain().to_string(),
            self.lifetime,
        );
        let wire = TokenClaims {
            sub: claims.subject().to_string(),
            role: claims.role(),
            dom: claims.domain().to_string(),
            iat: claims.issued_at().timestamp(),
            exp: claims.expires_at().timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &wire, &self.encoding_key).map_err(|e| {
            TokenIssueError {
                details: e.to_string(),
            }
        })
    }

    /// Classifies a presented token into session evidence for the gate.
    ///
    /// Expired signatures map to `Expired`; every other failure (bad
    /// signature, malformed payload, unparseable subject) maps to
    /// `Invalid`.
    #[must_use]
    pub fn verify(&self, token: &str) -> SessionState {
        let validation = Validation::new(Algorithm::HS256);

        let data = match decode::<TokenClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => data,
            Err(e) => {
                return match e.kind() {
                    ErrorKind::ExpiredSignature => SessionState::Expired,
                    _ => SessionState::Invalid,
                };
            }
        };

        let wire = data.claims;
        let Ok(subject) = AccountId::from_str(&wire.sub) else {
            return SessionState::Invalid;
        };
        let (Some(issued_at), Some(expires_at)) = (
            DateTime::from_timestamp(wire.iat, 0),
            DateTime::from_timestamp(wire.exp, 0),
        ) else {
            return SessionState::Invalid;
        };

        SessionState::Authenticated(SessionClaims::with_all_fields(
            subject, wire.role, wire.dom, issued_at, expires_at,
        ))
    }
}
