//! Shared data model for the signoff workspace
//!
//! This crate defines the annotation entities exchanged between the overlay
//! editor, the persistence endpoint, and the flattening engine.

pub mod annotation;
pub mod document;

pub use annotation::{
    Annotation, AnnotationPayload, InvalidAnnotation, OverlayRect, RenderSize,
};
pub use document::DocumentMeta;
