//! ffmpeg process launcher.
//!
//! Spawns the transcoder with a fixed low-latency HLS argument template and
//! owns the resulting child. Output streams are drained in the background
//! into bounded tail buffers so a chatty ffmpeg never blocks on a full pipe,
//! while the last few KiB stay available as failure diagnostics.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::error::StreamStartError;

/// Target HLS segment duration in seconds.
pub const HLS_SEGMENT_SECS: u32 = 2;

/// Number of segments kept in the live playlist.
pub const HLS_LIST_SIZE: u32 = 10;

/// Segments falling out of the playlist are deleted from disk.
pub const HLS_FLAGS: &str = "delete_segments+append_list";

/// Bytes of stdout/stderr retained per stream.
const OUTPUT_TAIL_BYTES: usize = 16 * 1024;

/// How long to wait for an exited process's output to finish draining.
const DIAGNOSTIC_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Build the ffmpeg argument list for converting `source_url` to HLS at
/// `output`.
pub fn hls_args(source_url: &str, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-i",
        source_url,
        "-c:v",
        "libx264",
        "-preset",
        "ultrafast",
        "-tune",
        "zerolatency",
        "-c:a",
        "aac",
        "-f",
        "hls",
    ]
    .iter()
    .map(OsString::from)
    .collect();

    args.extend([
        OsString::from("-hls_time"),
        OsString::from(HLS_SEGMENT_SECS.to_string()),
        OsString::from("-hls_list_size"),
        OsString::from(HLS_LIST_SIZE.to_string()),
        OsString::from("-hls_flags"),
        OsString::from(HLS_FLAGS),
        output.as_os_str().to_owned(),
    ]);
    args
}

/// Resolve the configured transcoder to an executable path.
///
/// A value containing a path separator is checked as-is; a bare name is
/// searched for on `PATH`.
pub fn resolve_binary(configured: Option<&Path>) -> Result<PathBuf, StreamStartError> {
    let path = configured
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| {
            StreamStartError::Configuration(
                "FFMPEG_PATH is not set; live streams cannot be transcoded".to_string(),
            )
        })?;

    if path.components().count() > 1 || path.is_absolute() {
        return if is_executable(path) {
            Ok(path.to_path_buf())
        } else {
            Err(StreamStartError::Configuration(format!(
                "{} does not exist or is not executable",
                path.display()
            )))
        };
    }

    std::env::var_os("PATH")
        .iter()
        .flat_map(std::env::split_paths)
        .map(|dir| dir.join(path))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(|| {
            StreamStartError::Configuration(format!(
                "'{}' was not found on PATH",
                path.display()
            ))
        })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// ---------------------------------------------------------------------------
// Process handle
// ---------------------------------------------------------------------------

/// A running (or exited) transcoder process.
///
/// The child is spawned with `kill_on_drop`, so dropping the handle on any
/// path kills the process even if [`TranscodeProcess::terminate`] was never
/// reached.
pub struct TranscodeProcess {
    child: Child,
    pid: Option<u32>,
    exit_status: Option<ExitStatus>,
    stdout_tail: Option<JoinHandle<Vec<u8>>>,
    stderr_tail: Option<JoinHandle<Vec<u8>>>,
}

impl std::fmt::Debug for TranscodeProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscodeProcess")
            .field("pid", &self.pid)
            .field("exit_status", &self.exit_status)
            .finish_non_exhaustive()
    }
}

impl TranscodeProcess {
    fn new(mut child: Child) -> Self {
        let pid = child.id();
        let stdout_tail = child.stdout.take().map(|s| tokio::spawn(read_tail(s)));
        let stderr_tail = child.stderr.take().map(|s| tokio::spawn(read_tail(s)));
        Self {
            child,
            pid,
            exit_status: None,
            stdout_tail,
            stderr_tail,
        }
    }

    /// OS process id captured at spawn time.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Exit status if the process has exited, without blocking.
    pub fn try_exited(&mut self) -> Option<ExitStatus> {
        if self.exit_status.is_none() {
            match self.child.try_wait() {
                Ok(status) => self.exit_status = status,
                Err(e) => {
                    tracing::warn!(pid = ?self.pid, error = %e, "Failed to poll transcoder status");
                }
            }
        }
        self.exit_status
    }

    /// Captured diagnostic output: the stderr tail, or the stdout tail when
    /// stderr was empty. Meant for exited processes; each stream is only
    /// collected once.
    pub async fn diagnostics(&mut self) -> String {
        let stderr = collect_tail(self.stderr_tail.take()).await;
        let text = if stderr.trim().is_empty() {
            collect_tail(self.stdout_tail.take()).await
        } else {
            stderr
        };
        text.trim().to_string()
    }

    /// Ask the process to exit (SIGTERM), wait up to `grace`, then kill it.
    ///
    /// Always reaps the process. Returns the exit status when one could be
    /// observed. No-op for a process that already exited.
    pub async fn terminate(&mut self, grace: Duration) -> Option<ExitStatus> {
        if let Some(status) = self.try_exited() {
            return Some(status);
        }

        if request_shutdown(&mut self.child) {
            match tokio::time::timeout(grace, self.child.wait()).await {
                Ok(Ok(status)) => {
                    self.exit_status = Some(status);
                    return Some(status);
                }
                Ok(Err(e)) => {
                    tracing::warn!(pid = ?self.pid, error = %e, "Waiting for transcoder failed");
                }
                Err(_) => {
                    tracing::warn!(
                        pid = ?self.pid,
                        grace_ms = grace.as_millis() as u64,
                        "Transcoder ignored SIGTERM, killing",
                    );
                }
            }
        }

        if let Err(e) = self.child.kill().await {
            tracing::error!(pid = ?self.pid, error = %e, "Failed to kill transcoder");
        }
        self.exit_status = self.child.try_wait().ok().flatten();
        self.exit_status
    }
}

/// Deliver SIGTERM so ffmpeg can finalize its playlist.
#[cfg(unix)]
fn request_shutdown(child: &mut Child) -> bool {
    let Some(pid) = child.id() else {
        return false;
    };
    // SAFETY: `pid` belongs to our child, which has not been reaped yet
    // (`Child::id` returns `None` after that), so it cannot be recycled.
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    ret == 0
}

#[cfg(not(unix))]
fn request_shutdown(child: &mut Child) -> bool {
    child.start_kill().is_ok()
}

/// Read a stream to EOF, keeping only the last [`OUTPUT_TAIL_BYTES`].
async fn read_tail<R: AsyncRead + Unpin>(mut stream: R) -> Vec<u8> {
    let mut tail = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                tail.extend_from_slice(&buf[..n]);
                if tail.len() > OUTPUT_TAIL_BYTES {
                    let excess = tail.len() - OUTPUT_TAIL_BYTES;
                    tail.drain(..excess);
                }
            }
        }
    }
    tail
}

async fn collect_tail(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    let Some(handle) = handle else {
        return String::new();
    };
    match tokio::time::timeout(DIAGNOSTIC_DRAIN_TIMEOUT, handle).await {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Launcher
// ---------------------------------------------------------------------------

/// Starts and stops transcoder processes.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    binary: Option<PathBuf>,
    stop_grace: Duration,
}

impl ProcessLauncher {
    pub fn new(binary: Option<PathBuf>, stop_grace: Duration) -> Self {
        Self { binary, stop_grace }
    }

    /// The resolved transcoder binary, or a configuration error.
    pub fn binary(&self) -> Result<PathBuf, StreamStartError> {
        resolve_binary(self.binary.as_deref())
    }

    /// Spawn the transcoder reading `source_url` and writing an HLS playlist
    /// to `output_path`.
    pub fn start(
        &self,
        source_url: &str,
        output_path: &Path,
    ) -> Result<TranscodeProcess, StreamStartError> {
        let binary = self.binary()?;

        let child = Command::new(&binary)
            .args(hls_args(source_url, output_path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| StreamStartError::Launch {
                binary: binary.display().to_string(),
                source,
            })?;

        let process = TranscodeProcess::new(child);
        tracing::info!(
            pid = ?process.pid(),
            binary = %binary.display(),
            source_url,
            output = %output_path.display(),
            "Transcoder started",
        );
        Ok(process)
    }

    /// Terminate `process` if there is one. Idempotent.
    pub async fn stop(&self, process: Option<TranscodeProcess>) -> Option<ExitStatus> {
        let mut process = process?;
        let pid = process.pid();
        let status = process.terminate(self.stop_grace).await;
        tracing::info!(pid = ?pid, exit_code = ?status.and_then(|s| s.code()), "Transcoder stopped");
        status
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hls_args_follow_fixed_template() {
        let args: Vec<String> = hls_args("rtsp://cam/feed", Path::new("/out/stream.m3u8"))
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();

        assert_eq!(
            args.join(" "),
            "-i rtsp://cam/feed -c:v libx264 -preset ultrafast -tune zerolatency \
             -c:a aac -f hls -hls_time 2 -hls_list_size 10 \
             -hls_flags delete_segments+append_list /out/stream.m3u8"
        );
    }

    #[test]
    fn unset_binary_is_a_configuration_error() {
        assert!(matches!(
            resolve_binary(None),
            Err(StreamStartError::Configuration(_))
        ));
        assert!(matches!(
            resolve_binary(Some(Path::new(""))),
            Err(StreamStartError::Configuration(_))
        ));
    }

    #[test]
    fn missing_binary_path_is_a_configuration_error() {
        let err = resolve_binary(Some(Path::new("/nonexistent/bin/ffmpeg"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/bin/ffmpeg"));
    }

    #[test]
    fn unknown_bare_name_is_a_configuration_error() {
        let err = resolve_binary(Some(Path::new("definitely-not-a-real-transcoder-binary")))
            .unwrap_err();
        assert!(err.to_string().contains("not found on PATH"));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_rejected() {
        let f = tempfile::NamedTempFile::new().expect("create temp file");
        assert!(matches!(
            resolve_binary(Some(f.path())),
            Err(StreamStartError::Configuration(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn bare_name_resolves_on_path() {
        let resolved = resolve_binary(Some(Path::new("sh"))).unwrap();
        assert!(resolved.is_absolute() || resolved.components().count() > 1);
        assert!(resolved.ends_with("sh"));
    }

    #[tokio::test]
    async fn stop_without_process_is_a_noop() {
        let launcher = ProcessLauncher::new(None, Duration::from_millis(10));
        assert!(launcher.stop(None).await.is_none());
    }

    #[tokio::test]
    async fn read_tail_keeps_only_the_end() {
        let data: Vec<u8> = (0..OUTPUT_TAIL_BYTES + 100).map(|i| (i % 251) as u8).collect();
        let tail = read_tail(&data[..]).await;
        assert_eq!(tail.len(), OUTPUT_TAIL_BYTES);
        assert_eq!(&tail[..], &data[100..]);
    }
}
