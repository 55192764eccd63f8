//! Document flattening
//!
//! This crate bakes a document's annotation set into a new PDF using lopdf.
//! Signature images are decoded and embedded as image XObjects, text is
//! drawn with the built-in Helvetica font, and signature field placeholders
//! are dropped.

pub mod error;
pub mod flatten;
pub mod image;
pub mod text;

pub use error::FlattenError;
pub use flatten::flatten_document;

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, FlattenError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| FlattenError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}
