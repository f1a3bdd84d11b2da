//! Email-domain whitelist.
//!
//! A domain is whitelisted if it appears in the static environment
//! allow-list OR has an active row in the persisted table. The two sources
//! are a deliberate redundancy (bootstrap trust before the table is
//! populated) and are checked as an explicit union; neither supersedes the
//! other. Store faults fail closed: a lookup error is never interpreted as
//! "whitelisted".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::store::WhitelistStore;

/// A persisted whitelist row.
///
/// Rows are created by operator action and soft-disabled by clearing
/// `active`; they are never physically deleted in normal operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// The email domain, stored lowercase.
    pub domain: String,
    /// Whether the domain is currently allowed.
    pub active: bool,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl WhitelistEntry {
    /// Creates a new active entry, normalizing the domain to lowercase.
    #[must_use]
    pub fn new(domain: &str) -> Self {
        let now = Utc::now();
        Self {
            domain: domain.trim().to_lowercase(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The combined static + persisted domain whitelist.
pub struct DomainWhitelist {
    static_domains: HashSet<String>,
    store: Arc<dyn WhitelistStore>,
}

impl DomainWhitelist {
    /// Creates a whitelist over a static allow-list and a persisted store.
    ///
    /// Static domains are normalized to lowercase; empty entries are
    /// discarded.
    #[must_use]
    pub fn new(
        static_domains: impl IntoIterator<Item = String>,
        store: Arc<dyn WhitelistStore>,
    ) -> Self {
        let static_domains = static_domains
            .into_iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self {
            static_domains,
            store,
        }
    }

    /// Returns the static allow-list.
    #[must_use]
    pub fn static_domains(&self) -> &HashSet<String> {
        &self.static_domains
    }

    /// Returns true if the domain is whitelisted by either source.
    ///
    /// The store is re-queried on every check — there is deliberately no
    /// cache, so operator toggles take effect on the next sign-in. A store
    /// error logs the fault and answers false.
    pub async fn is_whitelisted(&self, domain: &str) -> bool {
        let domain = domain.trim().to_lowercase();

        if self.static_domains.contains(&domain) {
            return true;
        }

        match self.store.find_domain(&domain).await {
            Ok(Some(entry)) => entry.active,
            Ok(None) => false,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    domain,
                    "whitelist lookup failed; failing closed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory whitelist store for tests.
    struct MemoryWhitelistStore {
        entries: Mutex<Vec<WhitelistEntry>>,
        fail: bool,
    }

    impl MemoryWhitelistStore {
        fn new(entries: Vec<WhitelistEntry>) -> Arc<Self> {
            Arc::new(Self {
                entries: Mutex::new(entries),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                entries: Mutex::new(Vec::new()),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl WhitelistStore for MemoryWhitelistStore {
        async fn find_domain(&self, domain: &str) -> Result<Option<WhitelistEntry>, StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable {
                    details: "simulated outage".to_string(),
                });
            }
            Ok(self
                .entries
                .lock()
                .expect("lock")
                .iter()
                .find(|e| e.domain == domain)
                .cloned())
        }

        async fn list(&self) -> Result<Vec<WhitelistEntry>, StoreError> {
            Ok(self.entries.lock().expect("lock").clone())
        }

        async fn insert(&self, entry: &WhitelistEntry) -> Result<(), StoreError> {
            let mut entries = self.entries.lock().expect("lock");
            if entries.iter().any(|e| e.domain == entry.domain) {
                return Err(StoreError::Conflict);
            }
            entries.push(entry.clone());
            Ok(())
        }

        async fn set_active(&self, domain: &str, active: bool) -> Result<bool, StoreError> {
            let mut entries = self.entries.lock().expect("lock");
            match entries.iter_mut().find(|e| e.domain == domain) {
                Some(entry) => {
                    entry.active = active;
                    entry.updated_at = Utc::now();
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    fn whitelist(
        static_domains: &[&str],
        store: Arc<MemoryWhitelistStore>,
    ) -> DomainWhitelist {
        DomainWhitelist::new(
            static_domains.iter().map(|d| (*d).to_string()),
            store,
        )
    }

    #[tokio::test]
    async fn static_domain_passes_with_empty_store() {
        let wl = whitelist(&["example.com"], MemoryWhitelistStore::new(Vec::new()));
        assert!(wl.is_whitelisted("example.com").await);
    }

    #[tokio::test]
    async fn store_domain_passes_with_empty_static_list() {
        let store = MemoryWhitelistStore::new(vec![WhitelistEntry::new("tours.example.org")]);
        let wl = whitelist(&[], store);
        assert!(wl.is_whitelisted("tours.example.org").await);
    }

    #[tokio::test]
    async fn inactive_row_does_not_whitelist() {
        let mut entry = WhitelistEntry::new("tours.example.org");
        entry.active = false;
        let store = MemoryWhitelistStore::new(vec![entry]);
        let wl = whitelist(&[], store);
        assert!(!wl.is_whitelisted("tours.example.org").await);
    }

    #[tokio::test]
    async fn unknown_domain_fails_both_sources() {
        let wl = whitelist(&["example.com"], MemoryWhitelistStore::new(Vec::new()));
        assert!(!wl.is_whitelisted("other.example.net").await);
    }

    #[tokio::test]
    async fn store_error_fails_closed() {
        let wl = whitelist(&[], MemoryWhitelistStore::failing());
        assert!(!wl.is_whitelisted("example.com").await);
    }

    #[tokio::test]
    async fn static_hit_short_circuits_store_fault() {
        // Union semantics: the static source answers even when the store is
        // down.
        let wl = whitelist(&["example.com"], MemoryWhitelistStore::failing());
        assert!(wl.is_whitelisted("example.com").await);
    }

    #[tokio::test]
    async fn domains_compare_case_insensitively() {
        let wl = whitelist(&["Example.COM"], MemoryWhitelistStore::new(Vec::new()));
        assert!(wl.is_whitelisted("EXAMPLE.com").await);
    }

    #[test]
    fn new_entry_is_active_and_lowercased() {
        let entry = WhitelistEntry::new("  Tours.Example.ORG ");
        assert_eq!(entry.domain, "tours.example.org");
        assert!(entry.active);
    }
}
