use std::sync::Arc;

use livestream_db::store::DocumentStore;
use livestream_transcode::StreamSupervisor;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Document store holding overlays and settings.
    pub store: Arc<dyn DocumentStore>,
    /// Owner of the single transcoding session.
    pub supervisor: StreamSupervisor,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
