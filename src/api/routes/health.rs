//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes health checks.
//!
//! - GET /health/live - Liveness check (process is alive)
//! - GET /health/ready - Readiness check (remote store reachable)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;
use crate::models::{Record, Shop};
use crate::store::{Query, StoreError};

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match check_store_health(&state).await {
        true => StatusCode::OK,
        false => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
///
/// Full health status with component details. A dropped push channel
/// degrades the service; an unreachable store makes it unhealthy.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store_ok = check_store_health(&state).await;
    let push = state.push_connected();

    let overall_status = match (store_ok, push) {
        (false, _) => "unhealthy",
        (true, Some(false)) => "degraded",
        _ => "healthy",
    };
    let push_status = match push {
        Some(true) => "connected",
        Some(false) => "disconnected",
        None => "disabled",
    };

    Json(HealthResponse {
        status: overall_status.to_string(),
        store: if store_ok { "ok" } else { "error" }.to_string(),
        push: push_status.to_string(),
        websocket_connections: state.hub.connection_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Anonymous one-row read; a refusal from the store still proves it is up
async fn check_store_health(state: &AppState) -> bool {
    let lookup = Query::new().eq("id", "00000000-0000-0000-0000-000000000000");
    match state.backend.anonymous().select(Shop::TABLE, &lookup).await {
        Ok(_) | Err(StoreError::Remote { .. }) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }
}
