//! Liveness and health endpoints.

use axum::{Json, extract::State, response::IntoResponse};
use http::StatusCode;
use serde::Serialize;

use crate::AppState;

/// Body of `GET /`.
pub const LIVENESS_MESSAGE: &str = "syncgate backend is running";

/// Detailed health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: String,
    /// Service version
    pub version: String,
    /// Individual subsystem statuses
    pub subsystems: SubsystemStatus,
}

/// Status of individual subsystems.
#[derive(Debug, Serialize)]
pub struct SubsystemStatus {
    pub database: ComponentStatus,
}

/// Status of a single component.
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub healthy: bool,
    /// Backend in use, e.g. "sqlite".
    pub backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

/// Static liveness string.
pub async fn root() -> &'static str {
    LIVENESS_MESSAGE
}

/// Full health check with subsystem status.
#[tracing::instrument(name = "health.check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = std::time::Instant::now();
    let db_healthy = state.db.health_check().await.is_ok();
    let latency_ms = start.elapsed().as_millis() as u64;

    let health = HealthStatus {
        status: if db_healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        subsystems: SubsystemStatus {
            database: ComponentStatus {
                healthy: db_healthy,
                backend: state.db.backend_name(),
                message: (!db_healthy).then(|| "Database connection failed".to_string()),
                latency_ms,
            },
        },
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}

/// Liveness probe. Always 200 while the process is serving.
#[tracing::instrument(name = "health.liveness")]
pub async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe. 503 when the database is unreachable.
#[tracing::instrument(name = "health.readiness", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if state.db.health_check().await.is_err() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}
