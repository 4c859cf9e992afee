//! Live stream to HLS conversion.
//!
//! [`launcher::ProcessLauncher`] spawns and terminates the ffmpeg process,
//! [`readiness::wait_for_manifest`] polls until its manifest is usable, and
//! [`supervisor::StreamSupervisor`] keeps at most one such session alive.

pub mod config;
pub mod error;
pub mod launcher;
pub mod readiness;
pub mod supervisor;

pub use config::TranscodeConfig;
pub use error::StreamStartError;
pub use supervisor::{StreamLocator, StreamState, StreamStatus, StreamSupervisor};
