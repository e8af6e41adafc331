//! Health check handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub sessions: &'static str,
}

/// Liveness probe - always returns OK if the service is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe - checks Postgres and the session store
pub async fn ready(State(state): State<AppState>) -> Result<Json<ReadyResponse>, StatusCode> {
    if let Err(e) = sqlx::query("SELECT 1").execute(&state.pool).await {
        tracing::error!(error = ?e, "database readiness check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    if let Err(e) = state.sessions.stats().await {
        tracing::error!(error = ?e, "session store readiness check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(ReadyResponse {
        status: "ready",
        database: "connected",
        sessions: "connected",
    }))
}
