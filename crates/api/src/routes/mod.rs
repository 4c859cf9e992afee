pub mod health;
pub mod overlays;
pub mod settings;
pub mod stream;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /overlays              list, create
/// /overlays/{id}         get, update, delete
///
/// /settings              get, upsert (POST)
///
/// /stream                start (POST), status (GET), stop (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/overlays", overlays::router())
        .nest("/settings", settings::router())
        .nest("/stream", stream::router())
}
