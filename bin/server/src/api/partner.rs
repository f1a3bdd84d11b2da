//! External (partner-facing) handlers.

use axum::Json;

use crate::types::{ApiSuccess, ServiceStatus};

/// Liveness/info probe for partner integrations.
pub async fn status() -> Json<ApiSuccess<ServiceStatus>> {
    Json(ApiSuccess::new(ServiceStatus {
        service: "trailhead",
        version: env!("CARGO_PKG_VERSION"),
    }))
}
