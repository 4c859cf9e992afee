use axum::routing::post;
use axum::Router;

use crate::handlers::stream;
use crate::state::AppState;

/// Stream routes, mounted at `/stream`.
///
/// ```text
/// POST   /     start_stream
/// GET    /     stream_status
/// DELETE /     stop_stream
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        post(stream::start_stream)
            .get(stream::stream_status)
            .delete(stream::stop_stream),
    )
}
