//! Postgres repository for accounts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use trailhead_access::{Account, AccountStore, Role, StoreError};
use trailhead_core::AccountId;

/// Maps a sqlx error to the store-trait error space.
///
/// Unique violations become `Conflict` so the lifecycle controller can
/// resolve concurrent first sign-ins; everything else is `Unavailable`.
pub(crate) fn map_sqlx_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Conflict;
        }
    }
    StoreError::Unavailable {
        details: e.to_string(),
    }
}

/// Row type for account queries.
#[derive(FromRow)]
struct AccountRow {
    id: String,
    email: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    role: String,
    active: bool,
    domain: String,
    last_login_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn try_into_account(self) -> Result<Account, StoreError> {
        let id = AccountId::from_str(&self.id).map_err(|e| StoreError::Unavailable {
            details: format!("invalid account id '{}': {}", self.id, e),
        })?;
        let role = Role::from_str(&self.role).map_err(|e| StoreError::Unavailable {
            details: format!("invalid account role: {e}"),
        })?;

        Ok(Account::with_all_fields(
            id,
            self.email,
            self.display_name,
            self.avatar_url,
            role,
            self.active,
            self.domain,
            self.last_login_at,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// Repository for account operations.
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, email, display_name, avatar_url, role, active, domain,
                   last_login_at, created_at, updated_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        match row {
            Some(r) => Ok(Some(r.try_into_account()?)),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, email, display_name, avatar_url, role, active, domain,
                   last_login_at, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        match row {
            Some(r) => Ok(Some(r.try_into_account()?)),
            None => Ok(None),
        }
    }

    async fn create(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, display_name, avatar_url, role, active,
                                  domain, last_login_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(account.id().to_string())
        .bind(account.email())
        .bind(account.display_name())
        .bind(account.avatar_url())
        .bind(account.role().as_str())
        .bind(account.is_active())
        .bind(account.domain())
        .bind(account.last_login_at())
        .bind(account.created_at())
        .bind(account.updated_at())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET display_name = $2, avatar_url = $3, role = $4, active = $5,
                last_login_at = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(account.id().to_string())
        .bind(account.display_name())
        .bind(account.avatar_url())
        .bind(account.role().as_str())
        .bind(account.is_active())
        .bind(account.last_login_at())
        .bind(account.updated_at())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, email, display_name, avatar_url, role, active, domain,
                   last_login_at, created_at, updated_at
            FROM accounts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        rows.into_iter().map(AccountRow::try_into_account).collect()
    }
}
