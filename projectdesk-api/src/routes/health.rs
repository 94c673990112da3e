/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "pool": { "active_connections": 1, "idle_connections": 1, "total_connections": 2 },
///   "login_throttle": "memory"
/// }
/// ```
///
/// The endpoint always answers 200; a failed database probe reports
/// `"degraded"` so load balancers can decide for themselves.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use projectdesk_shared::db::pool::{get_pool_stats, health_check as database_health_check, PoolStats};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: &'static str,

    pub version: &'static str,

    /// "connected" or "disconnected"
    pub database: &'static str,

    pub pool: PoolStats,

    /// Backend of the failed login store
    pub login_throttle: &'static str,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let connected = match database_health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    Ok(Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" },
        version: projectdesk_shared::VERSION,
        database: if connected { "connected" } else { "disconnected" },
        pool: get_pool_stats(&state.db),
        login_throttle: state.attempts.backend(),
    }))
}
