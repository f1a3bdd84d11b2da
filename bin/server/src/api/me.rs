//! Current-account handler.

use axum::{Json, extract::State};
use std::sync::Arc;
use trailhead_access::AccountStore;

use crate::auth::{AppState, RequireReadOnly};
use crate::db::AccountRepository;
use crate::error::ApiError;
use crate::types::{AccountView, ApiSuccess};

/// Returns the caller's own account.
///
/// The account is re-read from the store so the view reflects the current
/// role, not the possibly-stale role embedded in the session token.
pub async fn me(
    State(state): State<Arc<AppState>>,
    RequireReadOnly(claims): RequireReadOnly,
) -> Result<Json<ApiSuccess<AccountView>>, ApiError> {
    let repo = AccountRepository::new(state.db_pool.clone());
    let account = repo
        .find_by_id(claims.subject())
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    Ok(Json(ApiSuccess::new(AccountView::from(&account))))
}
