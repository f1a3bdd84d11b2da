//! Role hierarchy for platform access control.
//!
//! Every account carries exactly one role from a closed, totally ordered
//! enumeration. Endpoints declare a minimum role; a caller qualifies when
//! their role's rank is at least the required rank. The ordering
//! `Pending < ReadOnly < User < Staff < Manager < Admin` is a versioned
//! contract with the persisted store: any migration adding a role must
//! preserve this total order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform role, ordered from least to most privileged.
///
/// `Pending` is the role assigned at first sign-in; it authorizes nothing
/// beyond holding a session until an administrator promotes the account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Awaiting administrative approval; holds a session but no access.
    Pending,
    /// May read internal data, nothing more.
    ReadOnly,
    /// Standard user access.
    User,
    /// Operational staff access.
    Staff,
    /// Manager access, including account oversight.
    Manager,
    /// Full administrative access.
    Admin,
}

impl Role {
    /// Every role, in ascending rank order.
    pub const ALL: [Role; 6] = [
        Role::Pending,
        Role::ReadOnly,
        Role::User,
        Role::Staff,
        Role::Manager,
        Role::Admin,
    ];

    /// Returns the numeric rank used for minimum-privilege comparisons.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::ReadOnly => 1,
            Self::User => 2,
            Self::Staff => 3,
            Self::Manager => 4,
            Self::Admin => 5,
        }
    }

    /// Returns true if this role satisfies the given minimum role.
    #[must_use]
    pub const fn meets(&self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    /// Returns true if this role has admin privileges.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns the stable string form persisted in the store.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ReadOnly => "read_only",
            Self::User => "user",
            Self::Staff => "staff",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Returns the human-readable name used in denial messages.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::ReadOnly => "Read-only",
            Self::User => "User",
            Self::Staff => "Staff",
            Self::Manager => "Manager",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing a role from its stored string form fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    /// The string that failed to parse.
    pub value: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.value)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "read_only" => Ok(Self::ReadOnly),
            "user" => Ok(Self::User),
            "staff" => Ok(Self::Staff),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseRoleError {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_strictly_increasing() {
        for pair in Role::ALL.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn meets_agrees_with_rank_over_full_lattice() {
        for actual in Role::ALL {
            for required in Role::ALL {
                assert_eq!(
                    actual.meets(required),
                    actual.rank() >= required.rank(),
                    "meets() disagrees with rank for {actual} vs {required}",
                );
            }
        }
    }

    #[test]
    fn every_role_meets_itself() {
        for role in Role::ALL {
            assert!(role.meets(role));
        }
    }

    #[test]
    fn pending_meets_nothing_above_itself() {
        for required in Role::ALL {
            if required != Role::Pending {
                assert!(!Role::Pending.meets(required));
            }
        }
    }

    #[test]
    fn admin_meets_everything() {
        for required in Role::ALL {
            assert!(Role::Admin.meets(required));
        }
    }

    #[test]
    fn only_admin_is_admin() {
        for role in Role::ALL {
            assert_eq!(role.is_admin(), role == Role::Admin);
        }
    }

    #[test]
    fn string_form_roundtrips() {
        for role in Role::ALL {
            let parsed: Role = role.as_str().parse().expect("parse stored form");
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn parse_rejects_unknown_role() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert_eq!(err.value, "superuser");
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::ReadOnly).expect("serialize");
        assert_eq!(json, "\"read_only\"");

        let parsed: Role = serde_json::from_str("\"manager\"").expect("deserialize");
        assert_eq!(parsed, Role::Manager);
    }
}
