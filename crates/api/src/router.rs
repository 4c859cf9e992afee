//! HTTP surface of the livestream service: API routes, the HLS output
//! directory and the middleware around them. The binary and the API tests
//! both go through [`build_app_router`].

use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Assemble the overlay, settings and stream routes, plus the manifest and
/// segment files under the transcoder's public path.
///
/// A request passes the layers outermost first: CORS, request id
/// assignment, tracing, request id echo, timeout, panic recovery. The
/// timeout never undercuts a full stream start (readiness wait plus
/// stop grace).
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = build_cors_layer(config);
    let request_id_header = HeaderName::from_static("x-request-id");
    let streams = ServeDir::new(&config.transcode.output_dir);

    // The readiness wait can outlast a short request timeout.
    let readiness = config.transcode.readiness.timeout + config.transcode.stop_grace;
    let timeout = Duration::from_secs(config.request_timeout_secs).max(readiness);

    Router::new()
        .merge(routes::health::router())
        .nest("/api", routes::api_routes())
        .nest_service(&config.transcode.public_path, streams)
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// CORS for the browser player: the configured origins may call the four
/// API verbs with a JSON body.
///
/// # Panics
///
/// On an origin that is not a valid header value.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}
