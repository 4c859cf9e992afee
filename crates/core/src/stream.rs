//! Stream source classification.
//!
//! Decides from the URL scheme alone whether a source can be handed to the
//! browser as-is or has to go through the transcoder first.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::CoreError;

/// Schemes of live network streams that browsers cannot play directly.
pub const LIVE_SCHEMES: &[&str] = &["rtsp", "rtsps", "rtmp", "rtmps"];

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):").expect("scheme regex is valid"));

/// How a source reaches the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StreamMode {
    /// Served unchanged (already a file-based container).
    #[serde(rename = "mp4")]
    Passthrough,
    /// Converted to an HLS manifest by the transcoder.
    #[serde(rename = "hls")]
    Transcoded,
}

impl StreamMode {
    /// The wire name the browser client switches on.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamMode::Passthrough => "mp4",
            StreamMode::Transcoded => "hls",
        }
    }
}

/// Classify a source URL by its scheme.
///
/// Only [`LIVE_SCHEMES`] (matched case-insensitively) need the transcoder.
/// Everything else, including relative paths and URLs without a scheme, is
/// handed to the player unchanged. A blank URL is the only rejection.
pub fn classify_source(url: &str) -> Result<StreamMode, CoreError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(CoreError::missing_field("url"));
    }

    let live = SCHEME_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .is_some_and(|m| LIVE_SCHEMES.contains(&m.as_str().to_ascii_lowercase().as_str()));

    Ok(if live {
        StreamMode::Transcoded
    } else {
        StreamMode::Passthrough
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_schemes_are_transcoded() {
        assert_eq!(classify_source("rtsp://cam/feed").unwrap(), StreamMode::Transcoded);
        assert_eq!(classify_source("RTSP://cam/feed").unwrap(), StreamMode::Transcoded);
        assert_eq!(
            classify_source("rtmp://live.example/app/key").unwrap(),
            StreamMode::Transcoded
        );
    }

    #[test]
    fn http_sources_pass_through() {
        assert_eq!(
            classify_source("https://example.com/BigBuckBunny.mp4").unwrap(),
            StreamMode::Passthrough
        );
        assert_eq!(
            classify_source("  http://example.com/a.mp4 ").unwrap(),
            StreamMode::Passthrough
        );
    }

    #[test]
    fn non_live_schemes_pass_through() {
        for url in ["file:///videos/clip.mp4", "ftp://host/clip.mp4", "data:video/mp4;base64,AAAA"] {
            assert_eq!(classify_source(url).unwrap(), StreamMode::Passthrough, "{url}");
        }
    }

    #[test]
    fn urls_without_scheme_pass_through() {
        for url in ["/videos/clip.mp4", "clip.mp4", "cam/feed", "rtsp-cam/feed"] {
            assert_eq!(classify_source(url).unwrap(), StreamMode::Passthrough, "{url}");
        }
    }

    #[test]
    fn blank_url_is_rejected() {
        for url in ["", "   "] {
            let err = classify_source(url).unwrap_err();
            assert!(err.to_string().ends_with("Missing required field: url"));
        }
    }

    #[test]
    fn mode_wire_names() {
        assert_eq!(StreamMode::Passthrough.as_str(), "mp4");
        assert_eq!(StreamMode::Transcoded.as_str(), "hls");
        assert_eq!(serde_json::to_value(StreamMode::Transcoded).unwrap(), "hls");
    }
}
