#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use livestream_api::config::ServerConfig;
use livestream_api::router::build_app_router;
use livestream_api::state::AppState;
use livestream_db::memory::MemoryDocumentStore;
use livestream_transcode::readiness::ReadinessConfig;
use livestream_transcode::{StreamSupervisor, TranscodeConfig};

/// A router over an in-memory store, plus handles tests inspect directly.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryDocumentStore>,
    pub supervisor: StreamSupervisor,
    pub dir: TempDir,
}

impl TestApp {
    /// App with no transcoder configured.
    pub fn new() -> Self {
        Self::with_ffmpeg(None)
    }

    /// App whose transcoder is `ffmpeg`, writing into a temp directory.
    pub fn with_ffmpeg(ffmpeg: Option<PathBuf>) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = test_config(TranscodeConfig {
            ffmpeg_path: ffmpeg,
            output_dir: dir.path().join("streams"),
            readiness: ReadinessConfig {
                poll_interval: Duration::from_millis(50),
                timeout: Duration::from_secs(3),
            },
            stop_grace: Duration::from_secs(2),
            ..TranscodeConfig::default()
        });

        let store = Arc::new(MemoryDocumentStore::new());
        let supervisor = StreamSupervisor::new(config.transcode.clone());
        let state = AppState {
            store: store.clone(),
            supervisor: supervisor.clone(),
            config: Arc::new(config.clone()),
        };

        Self {
            router: build_app_router(state, &config),
            store,
            supervisor,
            dir,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(transcode: TranscodeConfig) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        transcode,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::POST, uri, body.to_string()).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::PUT, uri, body.to_string()).await
}

/// Send `raw` verbatim as a JSON body (for malformed payloads).
pub async fn send_json(app: Router, method: Method, uri: &str, raw: String) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(raw))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("response body is JSON")
}
