use axum::extract::State;
use axum::{routing::get, Json, Router};
use livestream_transcode::StreamState;
use serde::Serialize;

use crate::state::AppState;

/// Service banner returned from `/`.
#[derive(Serialize)]
pub struct InfoResponse {
    pub success: bool,
    pub message: &'static str,
    pub status: &'static str,
}

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the document store is reachable.
    pub store_healthy: bool,
    /// State of the transcoding session.
    pub stream_state: StreamState,
}

/// GET / -- service banner.
async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        success: true,
        message: "Livestream App API",
        status: "running",
    })
}

/// GET /health -- returns service, store and stream health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_healthy = state.store.ping().await.is_ok();
    let stream_state = state.supervisor.status().await.state;

    let status = if store_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        store_healthy,
        stream_state,
    })
}

/// Mount root-level routes (NOT under `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(info))
        .route("/health", get(health_check))
}
