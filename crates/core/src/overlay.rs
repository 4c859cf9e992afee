//! Overlay domain types and payload validation.
//!
//! An overlay is a text caption or logo image drawn over the video player.
//! The create payload arrives with every field optional so that absent
//! fields can be reported by name, in a fixed order, instead of as a generic
//! deserialization failure.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use validator::Validate;

use crate::error::CoreError;

/* --------------------------------------------------------------------------
   Validation limits
   -------------------------------------------------------------------------- */

/// Maximum length for an overlay name.
pub const MAX_NAME_LEN: u64 = 200;

/// Maximum length for overlay content (caption text or image URL).
pub const MAX_CONTENT_LEN: u64 = 4096;

/// Required fields of a create payload, in the order they are checked.
pub const REQUIRED_FIELDS: &[&str] = &["name", "type", "content", "position", "size"];

/* --------------------------------------------------------------------------
   Domain types
   -------------------------------------------------------------------------- */

/// What an overlay renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayType {
    /// `content` is literal text.
    Text,
    /// `content` is a reference to an image resource.
    Logo,
}

/// Top-left corner of an overlay, in player pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(serialize_with = "serialize_pixels")]
    pub x: f64,
    #[serde(serialize_with = "serialize_pixels")]
    pub y: f64,
}

/// Rendered size of an overlay, in player pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Size {
    #[serde(serialize_with = "serialize_pixels")]
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub width: f64,
    #[serde(serialize_with = "serialize_pixels")]
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub height: f64,
}

/// Largest magnitude at which every whole `f64` is exactly an integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Pixel values are held as `f64`, but whole values are written as JSON
/// integers so `{"x": 10}` is stored and echoed as `10`, not `10.0`.
/// Fractional values are written unchanged.
fn serialize_pixels<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Free-form styling options (font, colour, opacity, ...).
pub type Style = Map<String, Value>;

/* --------------------------------------------------------------------------
   Payloads
   -------------------------------------------------------------------------- */

/// Raw create payload (`POST /api/overlays`).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct OverlayInput {
    #[validate(length(min = 1, max = MAX_NAME_LEN, message = "must be 1-200 characters"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub overlay_type: Option<OverlayType>,
    #[validate(length(max = MAX_CONTENT_LEN, message = "is too long"))]
    pub content: Option<String>,
    pub position: Option<Position>,
    #[validate(nested)]
    pub size: Option<Size>,
    pub style: Option<Style>,
    pub visible: Option<bool>,
}

/// A fully-specified overlay, ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOverlay {
    pub name: String,
    #[serde(rename = "type")]
    pub overlay_type: OverlayType,
    pub content: String,
    pub position: Position,
    pub size: Size,
    pub style: Style,
    pub visible: bool,
}

impl OverlayInput {
    /// Check required fields and value constraints, filling in defaults
    /// (`style = {}`, `visible = true`).
    pub fn into_new(self) -> Result<NewOverlay, CoreError> {
        let missing = [
            self.name.is_none(),
            self.overlay_type.is_none(),
            self.content.is_none(),
            self.position.is_none(),
            self.size.is_none(),
        ];
        if let Some(idx) = missing.iter().position(|m| *m) {
            return Err(CoreError::missing_field(REQUIRED_FIELDS[idx]));
        }

        self.validate()?;

        match self {
            OverlayInput {
                name: Some(name),
                overlay_type: Some(overlay_type),
                content: Some(content),
                position: Some(position),
                size: Some(size),
                style,
                visible,
            } => Ok(NewOverlay {
                name,
                overlay_type,
                content,
                position,
                size,
                style: style.unwrap_or_default(),
                visible: visible.unwrap_or(true),
            }),
            _ => Err(CoreError::Internal(
                "required overlay field vanished after presence check".to_string(),
            )),
        }
    }
}

/// Partial update payload (`PUT /api/overlays/{id}`).
///
/// Only fields present in the request are changed.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct OverlayPatch {
    #[validate(length(min = 1, max = MAX_NAME_LEN, message = "must be 1-200 characters"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub overlay_type: Option<OverlayType>,
    #[validate(length(max = MAX_CONTENT_LEN, message = "is too long"))]
    pub content: Option<String>,
    pub position: Option<Position>,
    #[validate(nested)]
    pub size: Option<Size>,
    pub style: Option<Style>,
    pub visible: Option<bool>,
}

impl OverlayPatch {
    /// Validate the patch and render the present fields as a JSON object
    /// suitable for a field-level merge into the stored document.
    pub fn into_fields(self) -> Result<Map<String, Value>, CoreError> {
        self.validate()?;

        let mut fields = Map::new();
        if let Some(name) = self.name {
            fields.insert("name".into(), Value::String(name));
        }
        if let Some(overlay_type) = self.overlay_type {
            fields.insert("type".into(), to_value(overlay_type)?);
        }
        if let Some(content) = self.content {
            fields.insert("content".into(), Value::String(content));
        }
        if let Some(position) = self.position {
            fields.insert("position".into(), to_value(position)?);
        }
        if let Some(size) = self.size {
            fields.insert("size".into(), to_value(size)?);
        }
        if let Some(style) = self.style {
            fields.insert("style".into(), Value::Object(style));
        }
        if let Some(visible) = self.visible {
            fields.insert("visible".into(), Value::Bool(visible));
        }
        Ok(fields)
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value, CoreError> {
    serde_json::to_value(value).map_err(|e| CoreError::Internal(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn logo_input() -> OverlayInput {
        serde_json::from_value(json!({
            "name": "Logo",
            "type": "logo",
            "content": "http://x/logo.png",
            "position": { "x": 10, "y": 10 },
            "size": { "width": 100, "height": 50 }
        }))
        .unwrap()
    }

    #[test]
    fn into_new_fills_defaults() {
        let overlay = logo_input().into_new().unwrap();
        assert_eq!(overlay.name, "Logo");
        assert_eq!(overlay.overlay_type, OverlayType::Logo);
        assert_eq!(overlay.position, Position { x: 10.0, y: 10.0 });
        assert_eq!(overlay.size, Size { width: 100.0, height: 50.0 });
        assert!(overlay.visible);
        assert!(overlay.style.is_empty());
    }

    #[test]
    fn into_new_keeps_explicit_style_and_visibility() {
        let mut input = logo_input();
        input.visible = Some(false);
        input.style = Some(json!({ "opacity": 0.5 }).as_object().unwrap().clone());

        let overlay = input.into_new().unwrap();
        assert!(!overlay.visible);
        assert_eq!(overlay.style["opacity"], json!(0.5));
    }

    #[test]
    fn into_new_reports_first_missing_field() {
        let err = OverlayInput::default().into_new().unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: Missing required field: name");

        let mut input = logo_input();
        input.content = None;
        input.size = None;
        let err = input.into_new().unwrap_err();
        assert!(err.to_string().ends_with("Missing required field: content"));
    }

    #[test]
    fn into_new_rejects_empty_name() {
        let mut input = logo_input();
        input.name = Some(String::new());
        let err = input.into_new().unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn into_new_rejects_negative_size() {
        let mut input = logo_input();
        input.size = Some(Size { width: -1.0, height: 5.0 });
        assert!(matches!(input.into_new(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn whole_pixel_values_serialize_as_integers() {
        let position = Position { x: 10.0, y: -3.0 };
        assert_eq!(serde_json::to_string(&position).unwrap(), r#"{"x":10,"y":-3}"#);

        let size = Size { width: 100.5, height: 0.0 };
        assert_eq!(serde_json::to_value(size).unwrap(), json!({ "width": 100.5, "height": 0 }));
    }

    #[test]
    fn unknown_overlay_type_fails_to_deserialize() {
        let result: Result<OverlayInput, _> =
            serde_json::from_value(json!({ "type": "video" }));
        assert!(result.is_err());
    }

    #[test]
    fn patch_only_renders_present_fields() {
        let patch: OverlayPatch =
            serde_json::from_value(json!({ "visible": false, "position": { "x": 1, "y": 2 } }))
                .unwrap();
        let fields = patch.into_fields().unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields["visible"], json!(false));
        assert_eq!(fields["position"], json!({ "x": 1, "y": 2 }));
    }

    #[test]
    fn patch_renders_type_under_wire_name() {
        let patch: OverlayPatch = serde_json::from_value(json!({ "type": "text" })).unwrap();
        let fields = patch.into_fields().unwrap();
        assert_eq!(fields["type"], json!("text"));
    }

    #[test]
    fn empty_patch_is_valid() {
        let fields = OverlayPatch::default().into_fields().unwrap();
        assert!(fields.is_empty());
    }
}
