use axum::Json;
use flowgrid_core::client::HealthStatus;

/// GET /health: liveness probe.
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::up())
}
