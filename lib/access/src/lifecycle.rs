//! Account lifecycle controller.
//!
//! Runs once per successful third-party identity verification (the sign-in
//! callback) and decides whether the identity maps to a created, updated, or
//! rejected account. The controller never assigns a role other than the
//! initial `Pending`, and it never deletes: deactivation is terminal.
//!
//! "Identity verified" and "authorized for protected routes" are separate
//! outcomes: a brand-new or still-pending account completes sign-in at the
//! provider level and receives a session, while the gate's role check keeps
//! every internal endpoint closed to it.

use std::sync::Arc;

use crate::account::Account;
use crate::error::SignInError;
use crate::store::{AccountStore, StoreError};
use crate::whitelist::DomainWhitelist;

/// A verified identity produced by the provider layer.
///
/// The provider has already validated the token exchange; these fields are
/// trusted as authentic but not yet authorized.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// The verified email address.
    pub email: String,
    /// Display name, if the provider supplied one.
    pub display_name: Option<String>,
    /// Avatar URL, if the provider supplied one.
    pub avatar_url: Option<String>,
    /// Workspace domain claim (`hd`), if the provider supplied one.
    pub hosted_domain: Option<String>,
}

/// Result of a completed sign-in.
#[derive(Debug, Clone)]
pub struct SignInOutcome {
    /// The account as persisted, freshly read or written.
    pub account: Account,
    /// True if this sign-in created the account.
    pub created: bool,
}

/// Extracts the whitelisting domain from a verified identity.
///
/// The email must contain exactly one `@` with non-empty local part and
/// domain; anything else hard-rejects the sign-in before any store access.
/// When the identity carries a workspace-domain claim, that claim wins over
/// the email's domain. The result is lowercased.
pub fn extract_domain(identity: &VerifiedIdentity) -> Result<String, SignInError> {
    let email = identity.email.trim();
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => {
            return Err(SignInError::InvalidEmail {
                email: email.to_string(),
            });
        }
    };
    if local.is_empty() || domain.is_empty() {
        return Err(SignInError::InvalidEmail {
            email: email.to_string(),
        });
    }

    match identity.hosted_domain.as_deref() {
        Some(hd) if !hd.trim().is_empty() => Ok(hd.trim().to_lowercase()),
        _ => Ok(domain.to_lowercase()),
    }
}

/// The account lifecycle controller.
pub struct SignInController {
    store: Arc<dyn AccountStore>,
    whitelist: DomainWhitelist,
}

impl SignInController {
    /// Creates a controller over the given store and whitelist.
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, whitelist: DomainWhitelist) -> Self {
        Self { store, whitelist }
    }

    /// Maps a verified identity to an account, creating it on first sign-in.
    ///
    /// Two concurrent first sign-ins for the same email race on the store's
    /// unique-email constraint; the loser converts the conflict into a read
    /// of the winner's row instead of failing the request.
    ///
    /// # Errors
    ///
    /// Rejects with `InvalidEmail`, `DomainNotWhitelisted`, or
    /// `AccountDeactivated`; aborts with `StoreUnavailable` on any store
    /// fault, leaving no partial writes.
    pub async fn sign_in(&self, identity: &VerifiedIdentity) -> Result<SignInOutcome, SignInError> {
        let domain = extract_domain(identity)?;

        if !self.whitelist.is_whitelisted(&domain).await {
            tracing::warn!(domain, "sign-in rejected: domain not whitelisted");
            return Err(SignInError::DomainNotWhitelisted { domain });
        }

        let email = identity.email.trim().to_lowercase();

        if let Some(account) = self.store.find_by_email(&email).await? {
            return self.complete_returning(account, identity).await;
        }

        let account = Account::new(
            email.clone(),
            domain,
            identity.display_name.clone(),
            identity.avatar_url.clone(),
        );
        match self.store.create(&account).await {
            Ok(()) => {
                tracing::info!(
                    account_id = %account.id(),
                    email,
                    "account created with pending role"
                );
                Ok(SignInOutcome {
                    account,
                    created: true,
                })
            }
            Err(StoreError::Conflict) => {
                // Lost the first-sign-in race; the winner's row exists now.
                let existing = self.store.find_by_email(&email).await?.ok_or_else(|| {
                    SignInError::StoreUnavailable {
                        details: "account missing after conflicting insert".to_string(),
                    }
                })?;
                self.complete_returning(existing, identity).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn complete_returning(
        &self,
        mut account: Account,
        identity: &VerifiedIdentity,
    ) -> Result<SignInOutcome, SignInError> {
        if !account.is_active() {
            tracing::warn!(
                account_id = %account.id(),
                "sign-in rejected: account deactivated"
            );
            return Err(SignInError::AccountDeactivated {
                email: account.email().to_string(),
            });
        }

        account.record_login(identity.display_name.clone(), identity.avatar_url.clone());
        self.store.update(&account).await?;

        tracing::info!(
            account_id = %account.id(),
            role = %account.role(),
            "sign-in completed"
        );
        Ok(SignInOutcome {
            account,
            created: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use crate::store::WhitelistStore;
    use crate::whitelist::WhitelistEntry;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use trailhead_core::AccountId;

    /// In-memory account store with unique-email semantics.
    #[derive(Default)]
    struct MemoryAccountStore {
        accounts: Mutex<HashMap<String, Account>>,
        fail_create: bool,
    }

    impl MemoryAccountStore {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn with_account(account: Account) -> Arc<Self> {
            let store = Self::default();
            store
                .accounts
                .lock()
                .expect("lock")
                .insert(account.email().to_string(), account);
            Arc::new(store)
        }

        fn failing_create() -> Arc<Self> {
            Arc::new(Self {
                accounts: Mutex::new(HashMap::new()),
                fail_create: true,
            })
        }

        fn count(&self) -> usize {
            self.accounts.lock().expect("lock").len()
        }

        fn get(&self, email: &str) -> Option<Account> {
            self.accounts.lock().expect("lock").get(email).cloned()
        }
    }

    #[async_trait]
    impl AccountStore for MemoryAccountStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
            Ok(self.accounts.lock().expect("lock").get(email).cloned())
        }

        async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
            Ok(self
                .accounts
                .lock()
                .expect("lock")
                .values()
                .find(|a| a.id() == id)
                .cloned())
        }

        async fn create(&self, account: &Account) -> Result<(), StoreError> {
            if self.fail_create {
                return Err(StoreError::Unavailable {
                    details: "simulated outage".to_string(),
                });
            }
            let mut accounts = self.accounts.lock().expect("lock");
            if accounts.contains_key(account.email()) {
                return Err(StoreError::Conflict);
            }
            accounts.insert(account.email().to_string(), account.clone());
            Ok(())
        }

        async fn update(&self, account: &Account) -> Result<(), StoreError> {
            self.accounts
                .lock()
                .expect("lock")
                .insert(account.email().to_string(), account.clone());
            Ok(())
        }

        async fn list(&self) -> Result<Vec<Account>, StoreError> {
            Ok(self.accounts.lock().expect("lock").values().cloned().collect())
        }
    }

    /// Store that simulates losing the first-sign-in race: the initial read
    /// sees no row, the insert conflicts, and the re-read sees the winner.
    struct RacingAccountStore {
        inner: Arc<MemoryAccountStore>,
        raced: AtomicBool,
    }

    impl RacingAccountStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: MemoryAccountStore::new(),
                raced: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl AccountStore for RacingAccountStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
            if !self.raced.load(Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_by_email(email).await
        }

        async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
            self.inner.find_by_id(id).await
        }

        async fn create(&self, account: &Account) -> Result<(), StoreError> {
            // The concurrent request commits first.
            let winner = Account::new(
                account.email().to_string(),
                account.domain().to_string(),
                account.display_name().map(str::to_string),
                None,
            );
            self.inner.create(&winner).await?;
            self.raced.store(true, Ordering::SeqCst);
            Err(StoreError::Conflict)
        }

        async fn update(&self, account: &Account) -> Result<(), StoreError> {
            self.inner.update(account).await
        }

        async fn list(&self) -> Result<Vec<Account>, StoreError> {
            self.inner.list().await
        }
    }

    /// Whitelist store with no rows; static domains drive the tests here.
    struct EmptyWhitelistStore;

    #[async_trait]
    impl WhitelistStore for EmptyWhitelistStore {
        async fn find_domain(&self, _domain: &str) -> Result<Option<WhitelistEntry>, StoreError> {
            Ok(None)
        }

        async fn list(&self) -> Result<Vec<WhitelistEntry>, StoreError> {
            Ok(Vec::new())
        }

        async fn insert(&self, _entry: &WhitelistEntry) -> Result<(), StoreError> {
            Ok(())
        }

        async fn set_active(&self, _domain: &str, _active: bool) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    fn whitelist(domains: &[&str]) -> DomainWhitelist {
        DomainWhitelist::new(
            domains.iter().map(|d| (*d).to_string()),
            Arc::new(EmptyWhitelistStore),
        )
    }

    fn identity(email: &str) -> VerifiedIdentity {
        VerifiedIdentity {
            email: email.to_string(),
            display_name: Some("Test Guide".to_string()),
            avatar_url: None,
            hosted_domain: None,
        }
    }

    #[test]
    fn domain_extraction_uses_email_domain() {
        let domain = extract_domain(&identity("a.b+tag@sub.example.com")).expect("valid");
        assert_eq!(domain, "sub.example.com");
    }

    #[test]
    fn domain_extraction_rejects_zero_at_signs() {
        let err = extract_domain(&identity("no-at-sign.example.com")).unwrap_err();
        assert!(matches!(err, SignInError::InvalidEmail { .. }));
    }

    #[test]
    fn domain_extraction_rejects_multiple_at_signs() {
        let err = extract_domain(&identity("a@b@example.com")).unwrap_err();
        assert!(matches!(err, SignInError::InvalidEmail { .. }));
    }

    #[test]
    fn domain_extraction_rejects_empty_parts() {
        assert!(extract_domain(&identity("@example.com")).is_err());
        assert!(extract_domain(&identity("alice@")).is_err());
    }

    #[test]
    fn hosted_domain_claim_wins_over_email_domain() {
        let mut id = identity("alice@personal.example.com");
        id.hosted_domain = Some("Workspace.Example.ORG".to_string());
        assert_eq!(extract_domain(&id).expect("valid"), "workspace.example.org");
    }

    #[test]
    fn malformed_email_rejected_even_with_hosted_domain() {
        let mut id = identity("not-an-email");
        id.hosted_domain = Some("workspace.example.org".to_string());
        assert!(extract_domain(&id).is_err());
    }

    #[tokio::test]
    async fn first_sign_in_creates_pending_account() {
        // Scenario A: whitelisted domain, brand-new email.
        let store = MemoryAccountStore::new();
        let controller = SignInController::new(store.clone(), whitelist(&["example.com"]));

        let outcome = controller
            .sign_in(&identity("alice@example.com"))
            .await
            .expect("sign-in succeeds");

        assert!(outcome.created);
        assert_eq!(outcome.account.role(), Role::Pending);
        assert!(outcome.account.is_active());
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn non_whitelisted_domain_rejected_without_side_effects() {
        // Scenario B: no account row may exist afterwards.
        let store = MemoryAccountStore::new();
        let controller = SignInController::new(store.clone(), whitelist(&["example.com"]));

        let err = controller
            .sign_in(&identity("mallory@evil.example.net"))
            .await
            .unwrap_err();

        assert!(matches!(err, SignInError::DomainNotWhitelisted { .. }));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn deactivated_account_rejected_without_updates() {
        // Scenario C: even an Admin account is frozen once deactivated.
        let mut account = Account::new(
            "boss@example.com".to_string(),
            "example.com".to_string(),
            None,
            None,
        );
        account.set_role(Role::Admin);
        account.set_active(false);
        let frozen_login = account.last_login_at();

        let store = MemoryAccountStore::with_account(account);
        let controller = SignInController::new(store.clone(), whitelist(&["example.com"]));

        let err = controller
            .sign_in(&identity("boss@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, SignInError::AccountDeactivated { .. }));
        let stored = store.get("boss@example.com").expect("row kept");
        assert_eq!(stored.last_login_at(), frozen_login);
    }

    #[tokio::test]
    async fn returning_account_refreshes_login_and_keeps_role() {
        // Scenario D: active staff account.
        let mut account = Account::new(
            "guide@example.com".to_string(),
            "example.com".to_string(),
            Some("Old Name".to_string()),
            None,
        );
        account.set_role(Role::Staff);
        let old_login = account.last_login_at();

        let store = MemoryAccountStore::with_account(account);
        let controller = SignInController::new(store.clone(), whitelist(&["example.com"]));

        std::thread::sleep(std::time::Duration::from_millis(1));
        let outcome = controller
            .sign_in(&identity("guide@example.com"))
            .await
            .expect("sign-in succeeds");

        assert!(!outcome.created);
        assert_eq!(outcome.account.role(), Role::Staff);
        assert!(outcome.account.last_login_at() > old_login);
        assert_eq!(outcome.account.display_name(), Some("Test Guide"));
    }

    #[tokio::test]
    async fn pending_account_completes_provider_level_sign_in() {
        let account = Account::new(
            "new@example.com".to_string(),
            "example.com".to_string(),
            None,
            None,
        );
        let store = MemoryAccountStore::with_account(account);
        let controller = SignInController::new(store, whitelist(&["example.com"]));

        let outcome = controller
            .sign_in(&identity("new@example.com"))
            .await
            .expect("pending accounts still sign in");

        // Still pending: internal access stays blocked by the gate's role
        // check, not by this controller.
        assert_eq!(outcome.account.role(), Role::Pending);
    }

    #[tokio::test]
    async fn repeated_sign_in_is_idempotent_on_row_count() {
        let store = MemoryAccountStore::new();
        let controller = SignInController::new(store.clone(), whitelist(&["example.com"]));

        let first = controller
            .sign_in(&identity("alice@example.com"))
            .await
            .expect("first sign-in");
        let second = controller
            .sign_in(&identity("alice@example.com"))
            .await
            .expect("second sign-in");

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.account.id(), second.account.id());
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn losing_the_creation_race_reads_the_winning_row() {
        let store = RacingAccountStore::new();
        let controller = SignInController::new(store.clone(), whitelist(&["example.com"]));

        let outcome = controller
            .sign_in(&identity("alice@example.com"))
            .await
            .expect("conflict resolves to the existing row");

        assert!(!outcome.created);
        assert_eq!(store.list().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn email_is_normalized_to_lowercase() {
        let store = MemoryAccountStore::new();
        let controller = SignInController::new(store.clone(), whitelist(&["example.com"]));

        controller
            .sign_in(&identity("Alice@Example.COM"))
            .await
            .expect("sign-in succeeds");

        assert!(store.get("alice@example.com").is_some());
    }

    #[tokio::test]
    async fn store_fault_aborts_sign_in() {
        let store = MemoryAccountStore::failing_create();
        let controller = SignInController::new(store.clone(), whitelist(&["example.com"]));

        let err = controller
            .sign_in(&identity("alice@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, SignInError::StoreUnavailable { .. }));
        assert_eq!(store.count(), 0);
    }
}
