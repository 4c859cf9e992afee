//! Handlers for the `/overlays` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use livestream_core::error::CoreError;
use livestream_core::overlay::{OverlayInput, OverlayPatch};
use livestream_core::types::DocId;
use livestream_db::models::overlay::Overlay;
use livestream_db::repositories::OverlayRepo;
use livestream_db::store::DocumentStore;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::handlers::parse_id;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

const ENTITY: &str = "Overlay";

fn not_found(id: DocId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: ENTITY,
        id: id.to_string(),
    })
}

/// Verify that an overlay exists, returning it.
async fn ensure_overlay_exists(store: &dyn DocumentStore, id: DocId) -> AppResult<Overlay> {
    OverlayRepo::find_by_id(store, id)
        .await?
        .ok_or_else(|| not_found(id))
}

// ---------------------------------------------------------------------------
// GET /overlays
// ---------------------------------------------------------------------------

/// List all overlays, oldest first.
pub async fn list_overlays(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let items = OverlayRepo::list(state.store.as_ref()).await?;
    tracing::debug!(count = items.len(), "Listed overlays");
    Ok(Json(DataResponse::new(items)))
}

// ---------------------------------------------------------------------------
// POST /overlays
// ---------------------------------------------------------------------------

/// Create an overlay. Required fields are checked before anything is stored.
pub async fn create_overlay(
    State(state): State<AppState>,
    AppJson(input): AppJson<OverlayInput>,
) -> AppResult<impl IntoResponse> {
    let new_overlay = input.into_new()?;

    let created = OverlayRepo::create(state.store.as_ref(), &new_overlay).await?;
    tracing::info!(overlay_id = %created.id, name = %created.name, "Overlay created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

// ---------------------------------------------------------------------------
// GET /overlays/{id}
// ---------------------------------------------------------------------------

pub async fn get_overlay(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(ENTITY, &id)?;
    let overlay = ensure_overlay_exists(state.store.as_ref(), id).await?;
    Ok(Json(DataResponse::new(overlay)))
}

// ---------------------------------------------------------------------------
// PUT /overlays/{id}
// ---------------------------------------------------------------------------

/// Partially update an overlay; fields absent from the body keep their
/// stored values.
pub async fn update_overlay(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<OverlayPatch>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(ENTITY, &id)?;
    let fields = patch.into_fields()?;
    let changed: Vec<String> = fields.keys().cloned().collect();

    let updated = OverlayRepo::update(state.store.as_ref(), id, fields)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(overlay_id = %id, fields = ?changed, "Overlay updated");
    Ok(Json(DataResponse::new(updated)))
}

// ---------------------------------------------------------------------------
// DELETE /overlays/{id}
// ---------------------------------------------------------------------------

pub async fn delete_overlay(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(ENTITY, &id)?;
    if !OverlayRepo::delete(state.store.as_ref(), id).await? {
        return Err(not_found(id));
    }
    tracing::info!(overlay_id = %id, "Overlay deleted");
    Ok(Json(MessageResponse::new("Overlay deleted successfully")))
}
