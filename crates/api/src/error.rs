use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use livestream_core::error::CoreError;
use livestream_db::store::StoreError;
use livestream_transcode::StreamStartError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain, store and transcoder errors and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent
/// `{ "success": false, "error", "code" }` bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `livestream_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A document store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stream could not be started.
    #[error(transparent)]
    Stream(#[from] StreamStartError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Store(err) => classify_store_error(err),
            AppError::Stream(err) => classify_stream_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let body = json!({
            "success": false,
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}

/// Store failures never leak driver details to clients.
fn classify_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Document store error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "STORE_ERROR",
        "A storage error occurred".to_string(),
    )
}

/// Transcoder failures are reported verbatim: the message (binary path,
/// captured ffmpeg stderr) is what an operator needs to fix the setup.
fn classify_stream_error(err: &StreamStartError) -> (StatusCode, &'static str, String) {
    let code = match err {
        StreamStartError::InvalidSource(core) => return classify_core_error(core),
        StreamStartError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal stream error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            );
        }
        StreamStartError::Configuration(_) => "CONFIGURATION_ERROR",
        StreamStartError::Launch { .. } => "LAUNCH_ERROR",
        StreamStartError::ReadinessTimeout { .. } => "READINESS_TIMEOUT",
        StreamStartError::ProcessExitedEarly { .. } => "PROCESS_EXITED_EARLY",
        StreamStartError::Io(_) => "STREAM_OUTPUT_ERROR",
    };
    tracing::error!(error = %err, code, "Stream start failed");
    (StatusCode::INTERNAL_SERVER_ERROR, code, err.to_string())
}
