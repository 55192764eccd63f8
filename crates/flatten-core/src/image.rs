//! Signature image decoding and PDF image object construction
//!
//! Placed signatures travel as data URLs (PNG or JPEG). They are decoded to
//! raw RGB here and embedded as FlateDecode image XObjects, with any alpha
//! channel carried as a separate grayscale soft mask.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

use crate::error::FlattenError;

/// A decoded signature image, split into channels the PDF model wants.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    /// Present only when the source had a non-opaque pixel
    pub alpha: Option<Vec<u8>>,
}

/// Decode a `data:image/...;base64,` URL into raw channels. Accepts any
/// format the decoder recognizes; PNG and JPEG are the supported inputs.
pub fn decode_data_url(data_url: &str) -> Result<DecodedImage, FlattenError> {
    let encoded = data_url
        .split_once("base64,")
        .map(|(_, rest)| rest)
        .ok_or_else(|| FlattenError::ImageDecode("not a base64 data URL".to_string()))?;

    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| FlattenError::ImageDecode(e.to_string()))?;

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| FlattenError::ImageDecode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    let mut opaque = true;
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
        if pixel.0[3] != 255 {
            opaque = false;
        }
    }

    Ok(DecodedImage {
        width,
        height,
        rgb,
        alpha: (!opaque).then_some(alpha),
    })
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // Writing to a Vec cannot fail
    encoder.write_all(data).expect("deflate to memory");
    encoder.finish().expect("deflate to memory")
}

/// Embed a decoded image into the document and return the XObject id to
/// reference from page resources.
pub fn embed_image(doc: &mut Document, img: &DecodedImage) -> ObjectId {
    let smask_id = img.alpha.as_ref().map(|alpha| {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => img.width as i64,
            "Height" => img.height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        doc.add_object(Object::Stream(Stream::new(dict, deflate(alpha))))
    });

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => img.width as i64,
        "Height" => img.height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    if let Some(id) = smask_id {
        dict.set("SMask", Object::Reference(id));
    }
    doc.add_object(Object::Stream(Stream::new(dict, deflate(&img.rgb))))
}
