//! Overlay editing engine: modes, gestures, geometry, and persistence
//!
//! The overlay sits on top of a rendered document page and turns pointer
//! gestures into annotation mutations. Geometry is captured in overlay
//! space together with the render size of the page, and only mapped into
//! native page coordinates when a document is flattened.

pub mod controller;
pub mod coords;
pub mod error;
pub mod store;
pub mod text;

pub use controller::{Mode, Notice, OverlayController, SignatureImage};
pub use coords::{native_to_overlay, overlay_to_native, NativeRect};
pub use error::{EndpointError, TransitionError};
pub use store::{AnnotationEndpoint, AnnotationStore, SaveOutcome};
