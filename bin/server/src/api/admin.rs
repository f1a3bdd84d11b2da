//! Administrative handlers for accounts and the domain whitelist.
//!
//! These are the only paths that change an account's role or active flag;
//! the lifecycle controller never does. Listing requires Manager, mutation
//! requires Admin.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use trailhead_access::{AccountStore, Role, WhitelistEntry, WhitelistStore};
use trailhead_core::AccountId;

use crate::auth::{AppState, RequireAdmin, RequireManager};
use crate::db::{AccountRepository, AllowedDomainRepository};
use crate::error::ApiError;
use crate::types::{AccountView, ApiSuccess};

/// Lists all accounts, newest first.
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    RequireManager(_claims): RequireManager,
) -> Result<Json<ApiSuccess<Vec<AccountView>>>, ApiError> {
    let repo = AccountRepository::new(state.db_pool.clone());
    let accounts = repo.list().await?;

    Ok(Json(ApiSuccess::new(
        accounts.iter().map(AccountView::from).collect(),
    )))
}

/// Request body for account updates.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    /// New role, if changing.
    pub role: Option<Role>,
    /// New active flag, if changing.
    pub active: Option<bool>,
}

/// Updates an account's role and/or active flag.
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_claims): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UpdateAccountRequest>,
) -> Result<Json<ApiSuccess<AccountView>>, ApiError> {
    let id = AccountId::from_str(&id)
        .map_err(|_| ApiError::bad_request(format!("Invalid account id '{id}'")))?;

    let repo = AccountRepository::new(state.db_pool.clone());
    let mut account = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    if let Some(role) = body.role {
        tracing::info!(
            account_id = %account.id(),
            from = %account.role(),
            to = %role,
            "administrative role change"
        );
        account.set_role(role);
    }
    if let Some(active) = body.active {
        tracing::info!(
            account_id = %account.id(),
            active,
            "administrative active change"
        );
        account.set_active(active);
    }

    repo.update(&account).await?;

    Ok(Json(ApiSuccess::new(AccountView::from(&account))))
}

/// Lists all whitelist entries.
pub async fn list_domains(
    State(state): State<Arc<AppState>>,
    RequireManager(_claims): RequireManager,
) -> Result<Json<ApiSuccess<Vec<WhitelistEntry>>>, ApiError> {
    let repo = AllowedDomainRepository::new(state.db_pool.clone());
    let entries = repo.list().await?;

    Ok(Json(ApiSuccess::new(entries)))
}

/// Request body for whitelist creation.
#[derive(Debug, Deserialize)]
pub struct AddDomainRequest {
    /// The email domain to allow.
    pub domain: String,
}

/// Adds a domain to the whitelist.
pub async fn add_domain(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_claims): RequireAdmin,
    Json(body): Json<AddDomainRequest>,
) -> Result<Json<ApiSuccess<WhitelistEntry>>, ApiError> {
    let entry = WhitelistEntry::new(&body.domain);
    if entry.domain.is_empty() || !entry.domain.contains('.') {
        return Err(ApiError::bad_request(format!(
            "Invalid domain '{}'",
            body.domain
        )));
    }

    let repo = AllowedDomainRepository::new(state.db_pool.clone());
    repo.insert(&entry).await.map_err(|e| match e {
        trailhead_access::StoreError::Conflict => ApiError::Conflict {
            message: format!("Domain '{}' already exists", entry.domain),
        },
        other => other.into(),
    })?;

    tracing::info!(domain = %entry.domain, "whitelist entry created");
    Ok(Json(ApiSuccess::new(entry)))
}

/// Request body for toggling a whitelist entry.
#[derive(Debug, Deserialize)]
pub struct SetDomainActiveRequest {
    /// The new active flag.
    pub active: bool,
}

/// Soft-enables or soft-disables a whitelist entry.
///
/// Entries are never deleted; this toggle is the only mutation.
pub async fn set_domain_active(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_claims): RequireAdmin,
    Path(domain): Path<String>,
    Json(body): Json<SetDomainActiveRequest>,
) -> Result<Json<ApiSuccess<WhitelistEntry>>, ApiError> {
    let domain = domain.trim().to_lowercase();

    let repo = AllowedDomainRepository::new(state.db_pool.clone());
    let updated = repo.set_active(&domain, body.active).await?;
    if !updated {
        return Err(ApiError::not_found(format!("Domain '{domain}' not found")));
    }

    let entry = repo
        .find_domain(&domain)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Domain '{domain}' not found")))?;

    tracing::info!(domain = %entry.domain, active = entry.active, "whitelist entry toggled");
    Ok(Json(ApiSuccess::new(entry)))
}
