//! Handlers for the singleton settings document.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use livestream_db::models::settings::UpsertSettings;
use livestream_db::repositories::SettingsRepo;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /settings -- the settings document, or `{}` before the first save.
pub async fn get_settings(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let data = match SettingsRepo::get(state.store.as_ref()).await? {
        Some(settings) => serde_json::to_value(settings)
            .map_err(|e| AppError::InternalError(e.to_string()))?,
        None => Value::Object(Default::default()),
    };
    Ok(Json(DataResponse::new(data)))
}

/// POST /settings -- replace the settings document, creating it if needed.
pub async fn upsert_settings(
    State(state): State<AppState>,
    AppJson(input): AppJson<UpsertSettings>,
) -> AppResult<impl IntoResponse> {
    let settings = SettingsRepo::upsert(state.store.as_ref(), &input).await?;
    tracing::info!(rtsp_url = %settings.rtsp_url, "Settings saved");
    Ok(Json(DataResponse::new(settings)))
}
