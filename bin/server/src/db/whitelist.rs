//! Postgres repository for the allowed-domains table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use trailhead_access::{StoreError, WhitelistEntry, WhitelistStore};

use super::account::map_sqlx_err;

/// Row type for allowed-domain queries.
#[derive(FromRow)]
struct AllowedDomainRow {
    domain: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AllowedDomainRow> for WhitelistEntry {
    fn from(row: AllowedDomainRow) -> Self {
        Self {
            domain: row.domain,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for allowed-domain operations.
pub struct AllowedDomainRepository {
    pool: PgPool,
}

impl AllowedDomainRepository {
    /// Creates a new allowed-domain repository.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WhitelistStore for AllowedDomainRepository {
    async fn find_domain(&self, domain: &str) -> Result<Option<WhitelistEntry>, StoreError> {
        let row: Option<AllowedDomainRow> = sqlx::query_as(
            r#"
            SELECT domain, active, created_at, updated_at
            FROM allowed_domains
            WHERE domain = $1
            "#,
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(row.map(WhitelistEntry::from))
    }

    async fn list(&self) -> Result<Vec<WhitelistEntry>, StoreError> {
        let rows: Vec<AllowedDomainRow> = sqlx::query_as(
            r#"
            SELECT domain, active, created_at, updated_at
            FROM allowed_domains
            ORDER BY domain
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(rows.into_iter().map(WhitelistEntry::from).collect())
    }

    async fn insert(&self, entry: &WhitelistEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO allowed_domains (domain, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&entry.domain)
        .bind(entry.active)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(())
    }

    async fn set_active(&self, domain: &str, active: bool) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE allowed_domains
            SET active = $2, updated_at = NOW()
            WHERE domain = $1
            "#,
        )
        .bind(domain)
        .bind(active)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }
}
