//! Account domain type.
//!
//! An account maps a verified third-party identity to an internal record,
//! keyed by globally-unique email. Accounts are created by the lifecycle
//! controller at first sign-in and are never deleted by this subsystem;
//! deactivation (`active = false`) is the terminal normal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trailhead_core::AccountId;

use crate::role::Role;

/// An end-user account of the platform.
///
/// The role starts at `Pending` and changes only through explicit
/// administrative update — the lifecycle controller never modifies it after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Internal platform account ID.
    id: AccountId,
    /// Globally unique email address (stored lowercase).
    email: String,
    /// Display name from the identity provider, if available.
    display_name: Option<String>,
    /// Avatar URL from the identity provider, if available.
    avatar_url: Option<String>,
    /// Current role.
    role: Role,
    /// Whether the account may sign in.
    active: bool,
    /// Email domain, captured at creation time for whitelist auditing.
    domain: String,
    /// When the account last completed a sign-in.
    last_login_at: DateTime<Utc>,
    /// When the account record was created.
    created_at: DateTime<Utc>,
    /// When the account record was last updated.
    updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a brand-new account for a first verified sign-in.
    ///
    /// The role starts at `Pending` and the account is active; the current
    /// time is recorded as the first login.
    #[must_use]
    pub fn new(
        email: String,
        domain: String,
        display_name: Option<String>,
        avatar_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            email,
            display_name,
            avatar_url,
            role: Role::Pending,
            active: true,
            domain,
            last_login_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates an account with all fields specified.
    ///
    /// Use this when reconstituting an account from storage.
    #[must_use]
    #[expect(clippy::too_many_arguments)]
    pub fn with_all_fields(
        id: AccountId,
        email: String,
        display_name: Option<String>,
        avatar_url: Option<String>,
        role: Role,
        active: bool,
        domain: String,
        last_login_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            display_name,
            avatar_url,
            role,
            active,
            domain,
            last_login_at,
            created_at,
            updated_at,
        }
    }

    /// Returns the account's internal ID.
    #[must_use]
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Returns the account's email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the display name, if available.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the avatar URL, if available.
    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    /// Returns the current role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns true if the account may sign in.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the email domain captured at creation.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns when the account last completed a sign-in.
    #[must_use]
    pub fn last_login_at(&self) -> DateTime<Utc> {
        self.last_login_at
    }

    /// Returns when the account was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the account was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Records a completed sign-in, refreshing the login timestamp and any
    /// display fields that changed upstream. The role is never touched.
    pub fn record_login(&mut self, display_name: Option<String>, avatar_url: Option<String>) {
        if display_name.is_some() && display_name != self.display_name {
            self.display_name = display_name;
        }
        if avatar_url.is_some() && avatar_url != self.avatar_url {
            self.avatar_url = avatar_url;
        }
        let now = Utc::now();
        self.last_login_at = now;
        self.updated_at = now;
    }

    /// Sets the role. Administrative updates only.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.updated_at = Utc::now();
    }

    /// Activates or deactivates the account. Administrative updates only.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.updated_at = Utc::now();
    }
}
