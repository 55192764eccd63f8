//! Annotation entities placed on top of rendered document pages

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Rectangle in overlay space: origin top-left, y increasing downward,
/// units are on-screen pixels at the render scale active at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl OverlayRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Hit test a point against this rectangle
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

/// On-screen pixel size of the rendered page at the moment an annotation was
/// captured. Must travel with the geometry end-to-end or flattening will
/// mis-place content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSize {
    pub width: f64,
    pub height: f64,
}

impl RenderSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Type-specific annotation payload.
///
/// Serialized as a tagged union so every field lives natively on the wire
/// record instead of being smuggled through a renderer's serialization hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnnotationPayload {
    /// Unfilled placeholder region. Never rendered on flatten.
    SignatureField,
    /// A signature image committed to a page position. `image_data` is a
    /// data URL (PNG or JPEG).
    PlacedSignature { image_data: String },
    /// Free text with its font size in overlay units.
    TextField { text: String, font_size: f64 },
}

impl AnnotationPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            AnnotationPayload::SignatureField => "signature_field",
            AnnotationPayload::PlacedSignature { .. } => "placed_signature",
            AnnotationPayload::TextField { .. } => "text_field",
        }
    }
}

/// A single user-placed object tied to a document page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub document_id: String,
    /// 1-indexed page number
    pub page: u32,
    #[serde(flatten)]
    pub rect: OverlayRect,
    pub render_size: RenderSize,
    #[serde(flatten)]
    pub payload: AnnotationPayload,
}

impl Annotation {
    pub fn new(
        document_id: impl Into<String>,
        page: u32,
        rect: OverlayRect,
        render_size: RenderSize,
        payload: AnnotationPayload,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: document_id.into(),
            page,
            rect,
            render_size,
            payload,
        }
    }

    /// Validate this annotation against the owning document's page count
    pub fn validate(&self, page_count: u32) -> Result<(), InvalidAnnotation> {
        if self.page < 1 || self.page > page_count {
            return Err(InvalidAnnotation::PageOutOfRange {
                page: self.page,
                page_count,
            });
        }
        if !self.rect.width.is_finite()
            || !self.rect.height.is_finite()
            || self.rect.width <= 0.0
            || self.rect.height <= 0.0
        {
            return Err(InvalidAnnotation::BadGeometry { id: self.id.clone() });
        }
        if self.render_size.width <= 0.0 || self.render_size.height <= 0.0 {
            return Err(InvalidAnnotation::BadRenderSize { id: self.id.clone() });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvalidAnnotation {
    #[error("page {page} out of range 1..={page_count}")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("annotation {id} has non-positive or non-finite geometry")]
    BadGeometry { id: String },

    #[error("annotation {id} captured with a non-positive render size")]
    BadRenderSize { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_annotation(page: u32) -> Annotation {
        Annotation::new(
            "doc-1",
            page,
            OverlayRect::new(100.0, 50.0, 150.0, 50.0),
            RenderSize::new(600.0, 776.0),
            AnnotationPayload::TextField {
                text: "Hello".to_string(),
                font_size: 16.0,
            },
        )
    }

    #[test]
    fn test_ids_are_unique() {
        let a = text_annotation(1);
        let b = text_annotation(1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_rect_contains() {
        let rect = OverlayRect::new(10.0, 20.0, 100.0, 50.0);
        assert!(rect.contains(10.0, 20.0));
        assert!(rect.contains(110.0, 70.0));
        assert!(rect.contains(60.0, 45.0));
        assert!(!rect.contains(9.9, 45.0));
        assert!(!rect.contains(60.0, 70.1));
    }

    #[test]
    fn test_validate_page_bounds() {
        assert!(text_annotation(1).validate(3).is_ok());
        assert!(text_annotation(3).validate(3).is_ok());
        assert_eq!(
            text_annotation(4).validate(3),
            Err(InvalidAnnotation::PageOutOfRange {
                page: 4,
                page_count: 3
            })
        );
        assert_eq!(
            text_annotation(0).validate(3),
            Err(InvalidAnnotation::PageOutOfRange {
                page: 0,
                page_count: 3
            })
        );
    }

    #[test]
    fn test_validate_rejects_degenerate_geometry() {
        let mut ann = text_annotation(1);
        ann.rect.width = 0.0;
        assert!(matches!(
            ann.validate(1),
            Err(InvalidAnnotation::BadGeometry { .. })
        ));
    }

    #[test]
    fn test_payload_serializes_with_type_tag() {
        let ann = text_annotation(2);
        let json = serde_json::to_string(&ann).unwrap();
        assert!(json.contains("\"type\":\"text_field\""), "json: {}", json);
        assert!(json.contains("\"text\":\"Hello\""), "json: {}", json);

        let field = Annotation::new(
            "doc-1",
            1,
            OverlayRect::new(0.0, 0.0, 10.0, 10.0),
            RenderSize::new(600.0, 800.0),
            AnnotationPayload::SignatureField,
        );
        let json = serde_json::to_string(&field).unwrap();
        assert!(
            json.contains("\"type\":\"signature_field\""),
            "json: {}",
            json
        );
    }

    #[test]
    fn test_json_round_trip() {
        let ann = Annotation::new(
            "doc-9",
            2,
            OverlayRect::new(12.5, 30.0, 150.0, 50.0),
            RenderSize::new(612.0, 792.0),
            AnnotationPayload::PlacedSignature {
                image_data: "data:image/png;base64,AAAA".to_string(),
            },
        );
        let json = serde_json::to_string(&ann).unwrap();
        let back: Annotation = serde_json::from_str(&json).unwrap();
        assert_eq!(ann, back);
    }

    #[test]
    fn test_deserializes_wire_shape() {
        // The shape the remote endpoint stores: flat geometry + type tag
        let json = r#"{
            "id": "abc",
            "document_id": "doc-1",
            "page": 1,
            "x": 10.0, "y": 20.0, "width": 150.0, "height": 50.0,
            "render_size": { "width": 600.0, "height": 776.0 },
            "type": "text_field",
            "text": "Double click to edit",
            "font_size": 16.0
        }"#;
        let ann: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(ann.page, 1);
        assert_eq!(ann.rect.width, 150.0);
        match ann.payload {
            AnnotationPayload::TextField { ref text, font_size } => {
                assert_eq!(text, "Double click to edit");
                assert_eq!(font_size, 16.0);
            }
            _ => panic!("expected text_field payload"),
        }
    }
}
