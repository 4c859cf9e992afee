//! Overlay model as returned to clients.

use livestream_core::overlay::{NewOverlay, OverlayType, Position, Size, Style};
use livestream_core::types::{DocId, Timestamp};
use serde::Serialize;

use crate::store::{Document, StoreError};

/// Collection holding overlay documents.
pub const OVERLAYS: &str = "overlays";

/// A stored overlay. The id is serialized as `_id`, which the browser client
/// keys overlays by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub name: String,
    #[serde(rename = "type")]
    pub overlay_type: OverlayType,
    pub content: String,
    pub position: Position,
    pub size: Size,
    pub style: Style,
    pub visible: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<Document> for Overlay {
    type Error = StoreError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let body: NewOverlay = doc.parse_body(OVERLAYS)?;
        Ok(Overlay {
            id: doc.id,
            name: body.name,
            overlay_type: body.overlay_type,
            content: body.content,
            position: body.position,
            size: body.size,
            style: body.style,
            visible: body.visible,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}
