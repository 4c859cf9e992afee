use std::path::PathBuf;
use std::time::Duration;

use crate::readiness::ReadinessConfig;

/// Transcoding configuration.
///
/// | Env Var                   | Default          |
/// |---------------------------|------------------|
/// | `FFMPEG_PATH`             | unset            |
/// | `STREAM_OUTPUT_DIR`       | `static/streams` |
/// | `STREAM_POLL_INTERVAL_MS` | `500`            |
/// | `STREAM_READY_TIMEOUT_MS` | `8000`           |
/// | `STREAM_STOP_GRACE_SECS`  | `5`              |
#[derive(Debug, Clone)]
pub struct TranscodeConfig {
    /// ffmpeg binary: a path, or a bare name looked up on `PATH`.
    /// Live streams cannot be started while unset.
    pub ffmpeg_path: Option<PathBuf>,
    /// Directory the manifest and segments are written to (reused across
    /// sessions).
    pub output_dir: PathBuf,
    /// Manifest file name inside `output_dir`.
    pub manifest_name: String,
    /// URL path `output_dir` is served under.
    pub public_path: String,
    pub readiness: ReadinessConfig,
    /// How long a SIGTERM'd transcoder may take to exit before it is killed.
    pub stop_grace: Duration,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            output_dir: PathBuf::from("static/streams"),
            manifest_name: "stream.m3u8".to_string(),
            public_path: "/static/streams".to_string(),
            readiness: ReadinessConfig::default(),
            stop_grace: Duration::from_secs(5),
        }
    }
}

impl TranscodeConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ffmpeg_path = std::env::var("FFMPEG_PATH")
            .ok()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let output_dir = std::env::var("STREAM_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let poll_interval_ms: u64 = std::env::var("STREAM_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "500".into())
            .parse()
            .expect("STREAM_POLL_INTERVAL_MS must be a valid u64");

        let ready_timeout_ms: u64 = std::env::var("STREAM_READY_TIMEOUT_MS")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("STREAM_READY_TIMEOUT_MS must be a valid u64");

        let stop_grace_secs: u64 = std::env::var("STREAM_STOP_GRACE_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("STREAM_STOP_GRACE_SECS must be a valid u64");

        Self {
            ffmpeg_path,
            output_dir,
            readiness: ReadinessConfig {
                poll_interval: Duration::from_millis(poll_interval_ms.max(1)),
                timeout: Duration::from_millis(ready_timeout_ms),
            },
            stop_grace: Duration::from_secs(stop_grace_secs),
            ..defaults
        }
    }

    /// Full path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(&self.manifest_name)
    }

    /// URL the browser fetches the manifest from.
    pub fn manifest_url(&self) -> String {
        format!(
            "{}/{}",
            self.public_path.trim_end_matches('/'),
            self.manifest_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = TranscodeConfig::default();
        assert!(config.ffmpeg_path.is_none());
        assert_eq!(config.readiness.poll_interval, Duration::from_millis(500));
        assert_eq!(config.readiness.timeout, Duration::from_secs(8));
        assert_eq!(config.stop_grace, Duration::from_secs(5));
    }

    #[test]
    fn manifest_locations() {
        let config = TranscodeConfig {
            output_dir: PathBuf::from("/srv/out"),
            public_path: "/static/streams/".to_string(),
            ..TranscodeConfig::default()
        };
        assert_eq!(config.manifest_path(), PathBuf::from("/srv/out/stream.m3u8"));
        assert_eq!(config.manifest_url(), "/static/streams/stream.m3u8");
    }
}
