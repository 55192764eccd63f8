//! Bake an annotation set into a new PDF
//!
//! Each page's annotations are mapped from overlay space into native page
//! coordinates and drawn into appended content streams. The existing page
//! content is bracketed with q/Q so leftover graphics state cannot skew the
//! drawn objects. The input bytes are never modified; callers store the
//! output under a new identity.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use overlay_core::coords::{overlay_to_native, NativeRect};
use signoff_types::{Annotation, AnnotationPayload};
use tracing::warn;

use crate::error::FlattenError;
use crate::image::{decode_data_url, embed_image};
use crate::text::{escape_pdf_string, wrap_text};

const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Flatten the annotation set into the document. An empty set returns the
/// input unchanged, byte for byte.
pub fn flatten_document(
    pdf_bytes: &[u8],
    annotations: &[Annotation],
) -> Result<Vec<u8>, FlattenError> {
    if annotations.is_empty() {
        // No changes, return original
        return Ok(pdf_bytes.to_vec());
    }

    let mut doc =
        Document::load_mem(pdf_bytes).map_err(|e| FlattenError::ParseError(e.to_string()))?;

    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    for (page_num, page_id) in &pages {
        let page_annotations: Vec<Annotation> = annotations
            .iter()
            .filter(|a| a.page == *page_num)
            .cloned()
            .collect();
        if page_annotations.is_empty() {
            continue;
        }
        flatten_page(&mut doc, *page_id, &page_annotations)?;
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| FlattenError::OperationError(e.to_string()))?;
    Ok(output)
}

fn flatten_page(
    doc: &mut Document,
    page_id: ObjectId,
    annotations: &[Annotation],
) -> Result<(), FlattenError> {
    let (native_width, native_height) = page_size(doc, page_id)?;
    let mut resources = resolve_resources(doc, page_id);
    let mut fonts = owned_dict(doc, resources.get(b"Font").ok());
    let mut xobjects = owned_dict(doc, resources.get(b"XObject").ok());

    let mut ops = String::new();
    let mut font_key: Option<String> = None;

    for ann in annotations {
        let native = overlay_to_native(&ann.rect, ann.render_size, native_width, native_height);
        match &ann.payload {
            // Unfilled placeholders are never rendered
            AnnotationPayload::SignatureField => {}
            AnnotationPayload::TextField { text, font_size } => {
                let key = font_key
                    .get_or_insert_with(|| {
                        let key = fresh_key(&fonts, "F");
                        fonts.set(key.clone(), helvetica());
                        key
                    })
                    .clone();
                // Font size scales with the page like the geometry does
                let size = font_size * native_height / ann.render_size.height;
                draw_text(&mut ops, &key, text, size, &native);
            }
            AnnotationPayload::PlacedSignature { image_data } => {
                match decode_data_url(image_data) {
                    Ok(img) => {
                        let image_id = embed_image(doc, &img);
                        let key = fresh_key(&xobjects, "Im");
                        xobjects.set(key.clone(), Object::Reference(image_id));
                        draw_image(&mut ops, &key, &native);
                    }
                    Err(err) => {
                        warn!(annotation_id = %ann.id, error = %err, "skipping undecodable signature image");
                    }
                }
            }
        }
    }

    if ops.is_empty() {
        return Ok(());
    }

    if !fonts.is_empty() {
        resources.set("Font", Object::Dictionary(fonts));
    }
    if !xobjects.is_empty() {
        resources.set("XObject", Object::Dictionary(xobjects));
    }

    // Bracket the existing content with q/Q so its final graphics state
    // cannot displace the drawn annotations
    let save_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, b"q\n".to_vec())));
    let drawn_id = doc.add_object(Object::Stream(Stream::new(
        dictionary! {},
        format!("Q\n{}", ops).into_bytes(),
    )));

    let page_dict = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| FlattenError::OperationError(e.to_string()))?;

    let mut contents = match page_dict.get(b"Contents") {
        Ok(Object::Reference(id)) => vec![Object::Reference(save_id), Object::Reference(*id)],
        Ok(Object::Array(existing)) => {
            let mut streams = vec![Object::Reference(save_id)];
            streams.extend(existing.clone());
            streams
        }
        _ => vec![Object::Reference(save_id)],
    };
    contents.push(Object::Reference(drawn_id));

    page_dict.set("Contents", Object::Array(contents));
    page_dict.set("Resources", Object::Dictionary(resources));
    Ok(())
}

fn draw_text(ops: &mut String, font_key: &str, text: &str, font_size: f64, rect: &NativeRect) {
    let leading = font_size * LINE_HEIGHT_FACTOR;
    // First baseline sits one glyph height below the top of the box; long
    // text wraps to the box width and flows downward
    let baseline = rect.y + rect.height - font_size;
    ops.push_str(&format!(
        "BT\n/{font_key} {font_size:.2} Tf\n0 0 0 rg\n{leading:.2} TL\n{x:.2} {y:.2} Td\n",
        x = rect.x,
        y = baseline,
    ));
    for line in wrap_text(text, font_size, rect.width) {
        ops.push_str(&format!("({}) Tj\nT*\n", escape_pdf_string(&line)));
    }
    ops.push_str("ET\n");
}

fn draw_image(ops: &mut String, key: &str, rect: &NativeRect) {
    ops.push_str(&format!(
        "q\n{w:.2} 0 0 {h:.2} {x:.2} {y:.2} cm\n/{key} Do\nQ\n",
        w = rect.width,
        h = rect.height,
        x = rect.x,
        y = rect.y,
    ));
}

fn helvetica() -> Object {
    Object::Dictionary(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    })
}

/// Smallest unused `{prefix}{n}` name in a resource dictionary
fn fresh_key(dict: &Dictionary, prefix: &str) -> String {
    let mut n = 1;
    loop {
        let key = format!("{}{}", prefix, n);
        if !dict.has(key.as_bytes()) {
            return key;
        }
        n += 1;
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(v) => Some(*v as f64),
        Object::Real(v) => Some(*v as f64),
        _ => None,
    }
}

/// Look up a page attribute, following the Pages tree for inherited values
fn inherited_entry(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    loop {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return match value {
                Object::Reference(id) => doc.get_object(*id).ok().cloned(),
                other => Some(other.clone()),
            };
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return None,
        }
    }
}

fn page_size(doc: &Document, page_id: ObjectId) -> Result<(f64, f64), FlattenError> {
    let media_box = inherited_entry(doc, page_id, b"MediaBox")
        .ok_or_else(|| FlattenError::OperationError("page has no MediaBox".to_string()))?;
    let corners: Vec<f64> = media_box
        .as_array()
        .map_err(|e| FlattenError::OperationError(e.to_string()))?
        .iter()
        .filter_map(number)
        .collect();
    match corners.as_slice() {
        [x1, y1, x2, y2] => Ok(((x2 - x1).abs(), (y2 - y1).abs())),
        _ => Err(FlattenError::OperationError(
            "malformed MediaBox".to_string(),
        )),
    }
}

/// Page resources as an owned dictionary, so additions land on the page
/// itself rather than mutating a shared or inherited dictionary.
fn resolve_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    match inherited_entry(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    }
}

fn owned_dict(doc: &Document, entry: Option<&Object>) -> Dictionary {
    match entry {
        Some(Object::Dictionary(dict)) => dict.clone(),
        Some(Object::Reference(id)) => doc
            .get_object(*id)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .cloned()
            .unwrap_or_default(),
        _ => Dictionary::new(),
    }
}
