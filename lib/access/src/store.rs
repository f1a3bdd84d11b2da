//! Store traits consumed by the lifecycle controller and domain whitelist.
//!
//! The underlying storage engine is an external collaborator: these traits
//! model it as a key-indexed record store with unique-constraint semantics.
//! The server crate provides the Postgres implementations; tests supply
//! in-memory ones.

use async_trait::async_trait;
use std::fmt;
use trailhead_core::AccountId;

use crate::account::Account;
use crate::whitelist::WhitelistEntry;

/// Errors surfaced by store implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint rejected the write (e.g. duplicate email).
    Conflict,
    /// The store could not be reached or the operation failed.
    Unavailable { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict => write!(f, "unique constraint violated"),
            Self::Unavailable { details } => write!(f, "store unavailable: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persistence operations for accounts.
///
/// `create` must surface a unique-email violation as `StoreError::Conflict`
/// so the lifecycle controller can resolve concurrent first sign-ins to a
/// single row.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Finds an account by its (lowercased) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Finds an account by its internal ID.
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Inserts a new account. Fails with `Conflict` if the email exists.
    async fn create(&self, account: &Account) -> Result<(), StoreError>;

    /// Updates an existing account.
    async fn update(&self, account: &Account) -> Result<(), StoreError>;

    /// Lists all accounts, newest first.
    async fn list(&self) -> Result<Vec<Account>, StoreError>;
}

/// Persistence operations for whitelist entries.
///
/// Entries are soft-disabled by toggling `active`, never deleted.
#[async_trait]
pub trait WhitelistStore: Send + Sync {
    /// Finds the entry for a (lowercased) domain.
    async fn find_domain(&self, domain: &str) -> Result<Option<WhitelistEntry>, StoreError>;

    /// Lists all entries.
    async fn list(&self) -> Result<Vec<WhitelistEntry>, StoreError>;

    /// Inserts a new entry. Fails with `Conflict` if the domain exists.
    async fn insert(&self, entry: &WhitelistEntry) -> Result<(), StoreError>;

    /// Toggles an entry's active flag. Returns false if no row exists.
    async fn set_active(&self, domain: &str, active: bool) -> Result<bool, StoreError>;
}
