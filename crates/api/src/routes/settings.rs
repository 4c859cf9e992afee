use axum::routing::get;
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// Settings routes, mounted at `/settings`.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(settings::get_settings).post(settings::upsert_settings),
    )
}
