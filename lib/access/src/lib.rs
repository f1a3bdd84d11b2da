//! Authorization gate and account lifecycle for the trailhead platform.
//!
//! This crate provides:
//! - Service credentials and the startup-loaded registry (`CredentialRegistry`)
//! - Role-based access control (`Role` and its total order)
//! - Session claims carried by signed tokens (`SessionClaims`)
//! - The per-request authorization gate (`AuthorizationGate`)
//! - The email-domain whitelist (`DomainWhitelist`)
//! - The account lifecycle controller (`SignInController`)
//!
//! # Access Control Model
//!
//! Every API request presents a service API key mapped to route classes
//! (internal vs external) and allowed origins. Internal routes additionally
//! require a session minted at Google sign-in, carrying the account's role;
//! each internal endpoint declares a minimum role against the total order
//! `Pending < ReadOnly < User < Staff < Manager < Admin`.
//!
//! Sign-in itself is gated by an email-domain whitelist (static env list
//! unioned with a persisted table). A first sign-in from a whitelisted
//! domain creates the account with the `Pending` role: the identity is
//! verified and a session exists, but the gate's role check keeps every
//! internal endpoint closed until an administrator promotes the account.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trailhead_access::{
//!     AuthorizationGate, CredentialRegistry, GateRequest, Role, RouteClass, SessionState,
//! };
//!
//! let registry = CredentialRegistry::from_json(
//!     r#"[{"key": "partner-key", "name": "partner-portal", "route_classes": ["external"]}]"#,
//! )
//! .expect("valid credential configuration");
//!
//! let gate = AuthorizationGate::new(Arc::new(registry), false);
//! let decision = gate.authorize(GateRequest {
//!     api_key: Some("partner-key"),
//!     origin: None,
//!     route_class: RouteClass::External,
//!     session: SessionState::Missing,
//!     required_role: None,
//! });
//!
//! assert!(decision.is_allowed());
//! assert!(Role::Staff.meets(Role::User));
//! ```

pub mod account;
pub mod claims;
pub mod credential;
pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod role;
pub mod store;
pub mod whitelist;

// Re-export main types at crate root
pub use account::Account;
pub use claims::{SessionClaims, SessionState};
pub use credential::{CredentialRegistry, CredentialSpec, RegistryError, RouteClass, ServiceCredential};
pub use error::SignInError;
pub use gate::{AuthorizationGate, DenyReason, GateDecision, GateRequest};
pub use lifecycle::{SignInController, SignInOutcome, VerifiedIdentity, extract_domain};
pub use role::{ParseRoleError, Role};
pub use store::{AccountStore, StoreError, WhitelistStore};
pub use whitelist::{DomainWhitelist, WhitelistEntry};
