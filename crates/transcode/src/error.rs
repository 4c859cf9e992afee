use std::time::Duration;

use livestream_core::error::CoreError;

/// Why a stream could not be started.
#[derive(Debug, thiserror::Error)]
pub enum StreamStartError {
    /// The source URL is not something we can play or transcode.
    #[error(transparent)]
    InvalidSource(#[from] CoreError),

    /// The transcoder binary is unset, missing or not executable.
    #[error("Transcoder is not configured: {0}")]
    Configuration(String),

    #[error("Failed to launch transcoder '{binary}': {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {}ms waiting for HLS manifest", .waited.as_millis())]
    ReadinessTimeout { waited: Duration },

    #[error("Transcoder exited before creating manifest (exit code {exit_code:?}): {stderr}")]
    ProcessExitedEarly {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Stream output directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
