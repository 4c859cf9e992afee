//! Application settings (singleton document).

use livestream_core::types::{DocId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::store::{Document, StoreError};

/// Singleton collection holding the settings document.
pub const SETTINGS: &str = "settings";

/// The stored settings document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    #[serde(rename = "_id")]
    pub id: DocId,
    /// Source stream the player opens on load.
    pub rtsp_url: String,
    pub updated_at: Timestamp,
}

/// DTO for replacing the settings document. A missing URL clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsertSettings {
    #[serde(default)]
    pub rtsp_url: String,
}

impl TryFrom<Document> for Settings {
    type Error = StoreError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let body: UpsertSettings = doc.parse_body(SETTINGS)?;
        Ok(Settings {
            id: doc.id,
            rtsp_url: body.rtsp_url,
            updated_at: doc.updated_at,
        })
    }
}
