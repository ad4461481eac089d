//! Health check endpoint

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// GET /health - liveness probe, independent of the model
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}
