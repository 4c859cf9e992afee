//! Handlers for starting, inspecting and stopping the stream.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use livestream_core::error::CoreError;
use livestream_core::stream::StreamMode;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /stream`.
#[derive(Debug, Deserialize)]
pub struct StartStreamRequest {
    pub url: Option<String>,
}

/// Where the player should load the requested stream from.
#[derive(Debug, Serialize)]
pub struct StartStreamResponse {
    pub success: bool,
    pub stream_url: String,
    #[serde(rename = "type")]
    pub mode: StreamMode,
}

#[derive(Debug, Serialize)]
pub struct StopStreamResponse {
    pub stopped: bool,
}

/// POST /stream -- resolve a source URL to something the browser can play.
///
/// Live sources are transcoded to HLS and the response waits until the
/// manifest exists; `http(s)` sources come back unchanged.
pub async fn start_stream(
    State(state): State<AppState>,
    AppJson(input): AppJson<StartStreamRequest>,
) -> AppResult<impl IntoResponse> {
    let url = input
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| CoreError::missing_field("url"))?;

    let locator = state.supervisor.request_stream(&url).await?;
    tracing::info!(
        source_url = %url,
        stream_url = %locator.stream_url,
        mode = locator.mode.as_str(),
        "Stream ready",
    );
    Ok(Json(StartStreamResponse {
        success: true,
        stream_url: locator.stream_url,
        mode: locator.mode,
    }))
}

/// GET /stream -- current transcoding session status.
pub async fn stream_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse::new(state.supervisor.status().await))
}

/// DELETE /stream -- stop the active session. Idempotent.
pub async fn stop_stream(State(state): State<AppState>) -> impl IntoResponse {
    let stopped = state.supervisor.stop().await;
    if stopped {
        tracing::info!("Stream stopped on request");
    }
    Json(DataResponse::new(StopStreamResponse { stopped }))
}
