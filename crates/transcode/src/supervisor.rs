//! Single-session stream supervisor.
//!
//! Holds the one "current stream" slot. Starting a live stream always
//! terminates the previous session (SIGTERM, wait, kill) before clearing the
//! shared output directory and launching the replacement, so two transcoders
//! never write the same manifest.
//!
//! The slot is an async mutex held for the whole terminate → launch → poll
//! sequence. Concurrent start requests queue on it in arrival order and each
//! replaces its predecessor; the last one wins. Status reads go through a
//! `watch` channel and never wait on the slot.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use livestream_core::stream::{classify_source, StreamMode};
use livestream_core::types::Timestamp;
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::config::TranscodeConfig;
use crate::error::StreamStartError;
use crate::launcher::{ProcessLauncher, TranscodeProcess};
use crate::readiness::wait_for_manifest;

/// File extensions a previous session may have left in the output directory.
const STALE_OUTPUT_EXTENSIONS: &[&str] = &["m3u8", "ts", "m4s", "tmp"];

/// Lifecycle of the current-stream slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    Idle,
    Starting,
    Active,
    Terminating,
}

/// Snapshot of the supervisor, as published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamStatus {
    pub state: StreamState,
    pub source_url: Option<String>,
    pub pid: Option<u32>,
    pub stream_url: Option<String>,
    pub started_at: Option<Timestamp>,
}

impl StreamStatus {
    fn idle() -> Self {
        Self {
            state: StreamState::Idle,
            source_url: None,
            pid: None,
            stream_url: None,
            started_at: None,
        }
    }
}

/// Where the player should load a requested stream from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamLocator {
    #[serde(rename = "type")]
    pub mode: StreamMode,
    pub stream_url: String,
}

/// One live transcoder plus what it is converting.
struct TranscodeSession {
    process: TranscodeProcess,
    source_url: String,
    started_at: Timestamp,
}

struct Inner {
    config: TranscodeConfig,
    launcher: ProcessLauncher,
    slot: Mutex<Option<TranscodeSession>>,
    status: watch::Sender<StreamStatus>,
}

/// Owns the current transcoding session. Cheap to clone.
#[derive(Clone)]
pub struct StreamSupervisor {
    inner: Arc<Inner>,
}

impl StreamSupervisor {
    pub fn new(config: TranscodeConfig) -> Self {
        let launcher = ProcessLauncher::new(config.ffmpeg_path.clone(), config.stop_grace);
        let (status, _) = watch::channel(StreamStatus::idle());
        Self {
            inner: Arc::new(Inner {
                config,
                launcher,
                slot: Mutex::new(None),
                status,
            }),
        }
    }

    pub fn config(&self) -> &TranscodeConfig {
        &self.inner.config
    }

    /// Receive every status transition.
    pub fn subscribe(&self) -> watch::Receiver<StreamStatus> {
        self.inner.status.subscribe()
    }

    /// Resolve `url` to something the browser can play.
    ///
    /// Non-live sources are returned unchanged without spawning anything.
    /// Live sources replace the current session and resolve once the new
    /// manifest is non-empty. The start sequence runs on its own task, so a
    /// caller that goes away does not leave the slot half-replaced.
    pub async fn request_stream(&self, url: &str) -> Result<StreamLocator, StreamStartError> {
        let url = url.trim();
        match classify_source(url)? {
            StreamMode::Passthrough => {
                tracing::info!(source_url = url, "Passing stream through unchanged");
                Ok(StreamLocator {
                    mode: StreamMode::Passthrough,
                    stream_url: url.to_string(),
                })
            }
            StreamMode::Transcoded => {
                // Fail fast on a broken binary without disturbing the
                // running session.
                self.inner.launcher.binary()?;

                let inner = Arc::clone(&self.inner);
                let source_url = url.to_string();
                tokio::spawn(async move { inner.replace_session(source_url).await })
                    .await
                    .map_err(|e| StreamStartError::Internal(e.to_string()))?
            }
        }
    }

    /// Stop the current session. Returns `false` when nothing was running.
    pub async fn stop(&self) -> bool {
        let mut slot = self.inner.slot.lock().await;
        let Some(session) = slot.take() else {
            return false;
        };
        self.inner.terminate(session).await;
        self.inner.publish(StreamStatus::idle());
        true
    }

    /// Current status. Notices a transcoder that exited on its own and
    /// discards its session.
    ///
    /// The slot is released before the exited process's output is drained,
    /// so a start request arriving meanwhile is not held up.
    pub async fn status(&self) -> StreamStatus {
        let exited = match self.inner.slot.try_lock() {
            Ok(mut slot) => {
                let exit = slot.as_mut().and_then(|s| s.process.try_exited());
                match exit {
                    Some(exit) => {
                        self.inner.publish(StreamStatus::idle());
                        slot.take().map(|session| (session, exit))
                    }
                    None => None,
                }
            }
            Err(_) => None,
        };

        if let Some((mut session, exit)) = exited {
            let diagnostics = session.process.diagnostics().await;
            tracing::warn!(
                pid = ?session.process.pid(),
                source_url = %session.source_url,
                exit_code = ?exit.code(),
                diagnostics = %diagnostics,
                "Transcoder exited, discarding session",
            );
        }
        self.inner.status.borrow().clone()
    }
}

impl Inner {
    fn publish(&self, status: StreamStatus) {
        tracing::debug!(state = ?status.state, pid = ?status.pid, "Stream state changed");
        self.status.send_replace(status);
    }

    async fn terminate(&self, session: TranscodeSession) {
        self.publish(StreamStatus {
            state: StreamState::Terminating,
            source_url: Some(session.source_url.clone()),
            pid: session.process.pid(),
            stream_url: Some(self.config.manifest_url()),
            started_at: Some(session.started_at),
        });
        tracing::info!(
            pid = ?session.process.pid(),
            source_url = %session.source_url,
            "Stopping transcoding session",
        );
        self.launcher.stop(Some(session.process)).await;
    }

    async fn replace_session(&self, source_url: String) -> Result<StreamLocator, StreamStartError> {
        let mut slot = self.slot.lock().await;

        if let Some(previous) = slot.take() {
            self.terminate(previous).await;
        }

        let result = self.launch_session(source_url).await;
        match result {
            Ok(session) => {
                self.publish(StreamStatus {
                    state: StreamState::Active,
                    source_url: Some(session.source_url.clone()),
                    pid: session.process.pid(),
                    stream_url: Some(self.config.manifest_url()),
                    started_at: Some(session.started_at),
                });
                *slot = Some(session);
                Ok(StreamLocator {
                    mode: StreamMode::Transcoded,
                    stream_url: self.config.manifest_url(),
                })
            }
            Err(err) => {
                self.publish(StreamStatus::idle());
                Err(err)
            }
        }
    }

    /// Launch a transcoder into a freshly cleared output directory and wait
    /// for its manifest. The process is terminated on every failure path.
    async fn launch_session(&self, source_url: String) -> Result<TranscodeSession, StreamStartError> {
        let started_at = Utc::now();
        self.publish(StreamStatus {
            state: StreamState::Starting,
            source_url: Some(source_url.clone()),
            pid: None,
            stream_url: None,
            started_at: Some(started_at),
        });

        clear_stale_output(&self.config.output_dir).await?;

        let manifest = self.config.manifest_path();
        let mut process = self.launcher.start(&source_url, &manifest)?;
        self.publish(StreamStatus {
            state: StreamState::Starting,
            source_url: Some(source_url.clone()),
            pid: process.pid(),
            stream_url: None,
            started_at: Some(started_at),
        });

        match wait_for_manifest(&mut process, &manifest, &self.config.readiness).await {
            Ok(elapsed) => {
                tracing::info!(
                    pid = ?process.pid(),
                    source_url = %source_url,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "HLS manifest ready",
                );
                Ok(TranscodeSession {
                    process,
                    source_url,
                    started_at,
                })
            }
            Err(err) => {
                self.launcher.stop(Some(process)).await;
                Err(err)
            }
        }
    }
}

/// Create the output directory and remove playlist/segment files left by an
/// earlier session. Other files are left alone.
async fn clear_stale_output(dir: &Path) -> Result<(), StreamStartError> {
    tokio::fs::create_dir_all(dir).await?;

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut removed = 0usize;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let stale = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| STALE_OUTPUT_EXTENSIONS.contains(&e));
        if stale && entry.file_type().await?.is_file() {
            tokio::fs::remove_file(&path).await?;
            removed += 1;
        }
    }

    if removed > 0 {
        tracing::debug!(dir = %dir.display(), removed, "Cleared stale stream output");
    }
    Ok(())
}
