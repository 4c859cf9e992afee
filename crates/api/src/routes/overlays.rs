//! Route definitions for overlays, mounted at `/overlays`.
//!
//! ```text
//! GET    /            list_overlays
//! POST   /            create_overlay
//! GET    /{id}        get_overlay
//! PUT    /{id}        update_overlay
//! DELETE /{id}        delete_overlay
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::overlay;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(overlay::list_overlays).post(overlay::create_overlay),
        )
        .route(
            "/{id}",
            get(overlay::get_overlay)
                .put(overlay::update_overlay)
                .delete(overlay::delete_overlay),
        )
}
