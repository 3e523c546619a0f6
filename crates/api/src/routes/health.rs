//! Health check endpoints.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use telemetry::{health, metrics, ComponentHealthReport, MetricsSnapshot};

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub end_users_connected: bool,
    pub organizations_connected: bool,
    pub tenancies_resolved: u64,
    pub components: Vec<ComponentHealthReport>,
}

/// GET /health - Full health check.
pub async fn health_handler() -> Json<HealthResponse> {
    let report = health().report();

    Json(HealthResponse {
        status: format!("{:?}", report.status).to_lowercase(),
        end_users_connected: health().end_users.is_healthy(),
        organizations_connected: health().organizations.is_healthy(),
        tenancies_resolved: metrics().tenancies_resolved.get(),
        components: report.components,
    })
}

/// GET /metrics - Tenancy outcome counters and latencies.
pub async fn metrics_handler() -> Json<MetricsSnapshot> {
    Json(metrics().snapshot())
}

/// GET /health/ready - Readiness probe (can accept traffic).
pub async fn ready_handler() -> StatusCode {
    if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
