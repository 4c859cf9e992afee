//! Manifest readiness polling.
//!
//! ffmpeg offers no readiness callback, so after launch we watch the
//! filesystem: the session is ready once the manifest exists and is
//! non-empty, and has failed if the process exits first or the timeout
//! elapses.

use std::path::Path;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::StreamStartError;
use crate::launcher::TranscodeProcess;

/// Poll cadence and bound for [`wait_for_manifest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(8),
        }
    }
}

/// Whether `path` is a regular file with at least one byte in it.
pub async fn manifest_ready(path: &Path) -> bool {
    matches!(tokio::fs::metadata(path).await, Ok(m) if m.is_file() && m.len() > 0)
}

/// Poll until the manifest at `manifest` is usable.
///
/// Each tick checks, in order: manifest non-empty (ready), process exited
/// (fails with its captured stderr), deadline passed (fails with a
/// timeout). Returns how long readiness took.
pub async fn wait_for_manifest(
    process: &mut TranscodeProcess,
    manifest: &Path,
    config: &ReadinessConfig,
) -> Result<Duration, StreamStartError> {
    let started = Instant::now();
    let deadline = started + config.timeout;

    loop {
        if manifest_ready(manifest).await {
            return Ok(started.elapsed());
        }

        if let Some(status) = process.try_exited() {
            let stderr = process.diagnostics().await;
            tracing::error!(
                pid = ?process.pid(),
                exit_code = ?status.code(),
                stderr = %stderr,
                "Transcoder exited before creating manifest",
            );
            return Err(StreamStartError::ProcessExitedEarly {
                exit_code: status.code(),
                stderr,
            });
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::error!(
                pid = ?process.pid(),
                timeout_ms = config.timeout.as_millis() as u64,
                manifest = %manifest.display(),
                "Timed out waiting for HLS manifest",
            );
            return Err(StreamStartError::ReadinessTimeout {
                waited: config.timeout,
            });
        }

        tokio::time::sleep(config.poll_interval.min(deadline - now)).await;
    }
}
