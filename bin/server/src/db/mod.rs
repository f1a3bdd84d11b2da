//! Database repositories for the trailhead platform.
//!
//! This module provides the Postgres-backed implementations of the store
//! traits consumed by the lifecycle controller and the admin endpoints:
//! - Accounts (unique-email constrained)
//! - Allowed email domains (soft-disable only)

pub mod account;
pub mod whitelist;

pub use account::AccountRepository;
pub use whitelist::AllowedDomainRepository;
