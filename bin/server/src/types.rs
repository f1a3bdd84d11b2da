//! Shared response types for API handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use trailhead_access::{Account, Role};

/// Success envelope wrapping handler data.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiSuccess<T> {
    /// Wraps data in the success envelope.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Account representation returned to internal callers.
#[derive(Debug, Serialize)]
pub struct AccountView {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub active: bool,
    pub domain: String,
    pub last_login_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id().to_string(),
            email: account.email().to_string(),
            display_name: account.display_name().map(str::to_string),
            avatar_url: account.avatar_url().map(str::to_string),
            role: account.role(),
            active: account.is_active(),
            domain: account.domain().to_string(),
            last_login_at: account.last_login_at(),
            created_at: account.created_at(),
        }
    }
}

/// Service info returned on the external status probe.
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub service: &'static str,
    pub version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_view_reflects_the_account() {
        let account = Account::new(
            "alice@example.com".to_string(),
            "example.com".to_string(),
            Some("Alice".to_string()),
            None,
        );
        let view = AccountView::from(&account);

        assert_eq!(view.email, "alice@example.com");
        assert_eq!(view.role, Role::Pending);
        assert!(view.active);
        assert!(view.id.starts_with("acct_"));
    }

    #[test]
    fn success_envelope_serializes_the_contract_shape() {
        let envelope = ApiSuccess::new(serde_json::json!({"ok": 1}));
        let json = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "data": {"ok": 1},
            })
        );
    }
}
