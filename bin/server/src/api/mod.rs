//! API route handlers and router assembly.
//!
//! Handlers are deliberately thin: the interesting decisions happen in the
//! gate middleware and role extractors before a handler runs. Routers here
//! are nested under `/api/internal` and `/api/external` by `main`, each
//! behind its route-class gate.

pub mod admin;
pub mod me;
pub mod partner;

use axum::{
    Router,
    routing::{get, patch},
};
use std::sync::Arc;

use crate::auth::AppState;

/// Routes behind the internal gate. Each endpoint declares its minimum
/// role through an extractor.
pub fn internal_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(me::me))
        .route("/accounts", get(admin::list_accounts))
        .route("/accounts/{id}", patch(admin::update_account))
        .route(
            "/allowed-domains",
            get(admin::list_domains).post(admin::add_domain),
        )
        .route("/allowed-domains/{domain}", patch(admin::set_domain_active))
}

/// Routes behind the external gate. API-key only; never session-checked.
pub fn external_router() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(partner::status))
}
