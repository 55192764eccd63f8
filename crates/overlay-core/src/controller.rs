//! Overlay editing state machine
//!
//! One controller owns the editing session for an open document. It maps
//! pointer gestures to annotation mutations according to the active mode,
//! keeps per-gesture transient state in an explicit enum that is reset on
//! every mode transition, and drives the store so saves land once per
//! gesture rather than per pointer event.

use signoff_types::{Annotation, AnnotationPayload, DocumentMeta, OverlayRect, RenderSize};
use tracing::{debug, warn};

use crate::error::{EndpointError, TransitionError};
use crate::store::{AnnotationEndpoint, AnnotationStore};
use crate::text::approx_text_extent;

/// Drags smaller than this in either axis are discarded at pointer-up.
pub const MIN_FIELD_SIZE: f64 = 5.0;

/// Fixed placement size for a signature image, centered at the pointer.
pub const SIGNATURE_WIDTH: f64 = 150.0;
pub const SIGNATURE_HEIGHT: f64 = 50.0;

/// Placeholder content for a freshly created text annotation.
pub const DEFAULT_TEXT: &str = "Double click to edit";
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Editing modes. Exactly one is active; transitions only happen through
/// [`OverlayController::set_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    SignatureField,
    PlaceSignature,
    TextField,
}

/// Per-gesture state owned by the active mode. Reset unconditionally on
/// every transition and page change so no gesture leaks into the next mode.
#[derive(Debug, Clone, PartialEq)]
enum Transient {
    Idle,
    /// A signature field rectangle being dragged out. `origin` is the
    /// pointer-down corner; the rectangle anchors whichever corner is
    /// opposite the current drag direction.
    DrawingField { origin: (f64, f64), rect: OverlayRect },
    /// An existing annotation being moved. Offsets keep the grab point
    /// fixed under the pointer.
    Dragging {
        id: String,
        grab_dx: f64,
        grab_dy: f64,
    },
}

/// User-visible events produced by gesture handling, drained by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    FieldAdded,
    FieldTooSmall,
    SignaturePlaced,
    TextFieldAdded,
    EditingDisabled,
}

/// A prepared signature image, held read-only until placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureImage {
    pub data_url: String,
}

pub struct OverlayController<E: AnnotationEndpoint> {
    store: AnnotationStore<E>,
    document: DocumentMeta,
    mode: Mode,
    transient: Transient,
    page: u32,
    render_size: RenderSize,
    signature: Option<SignatureImage>,
    finalize_in_flight: bool,
}

impl<E: AnnotationEndpoint> OverlayController<E> {
    /// Open an editing session on page 1 at the given render size, loading
    /// the document's persisted annotations.
    pub fn open(endpoint: E, document: DocumentMeta, render_size: RenderSize) -> Self {
        let store = AnnotationStore::open(endpoint, document.id.clone());
        Self {
            store,
            document,
            mode: Mode::View,
            transient: Transient::Idle,
            page: 1,
            render_size,
            signature: None,
            finalize_in_flight: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn document(&self) -> &DocumentMeta {
        &self.document
    }

    pub fn store(&self) -> &AnnotationStore<E> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AnnotationStore<E> {
        &mut self.store
    }

    /// Annotations to draw for the current page, bottom to top
    pub fn visible(&self) -> Vec<&Annotation> {
        self.store.for_page(self.page).collect()
    }

    pub fn set_signature(&mut self, signature: SignatureImage) {
        self.signature = Some(signature);
    }

    pub fn clear_signature(&mut self) {
        self.signature = None;
        if self.mode == Mode::PlaceSignature {
            self.mode = Mode::View;
            self.transient = Transient::Idle;
        }
    }

    /// Switch editing modes. The previous mode's transient gesture state is
    /// torn down before the new mode becomes active. Refused transitions
    /// leave the controller unchanged, except that a finalized document
    /// always forces `View`.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), TransitionError> {
        if self.document.is_finalized && mode != Mode::View {
            self.mode = Mode::View;
            self.transient = Transient::Idle;
            return Err(TransitionError::DocumentFinalized);
        }
        if mode == Mode::PlaceSignature && self.signature.is_none() {
            return Err(TransitionError::SignatureUnavailable);
        }
        self.transient = Transient::Idle;
        self.mode = mode;
        Ok(())
    }

    /// Navigate to a page rendered at the given size. The overlay is fully
    /// torn down and rehydrated from the store, so any in-progress gesture
    /// is dropped.
    pub fn open_page(&mut self, page: u32, render_size: RenderSize) {
        self.transient = Transient::Idle;
        self.page = page;
        self.render_size = render_size;
        debug!(page, width = render_size.width, height = render_size.height, "page opened");
    }

    /// Re-render of the current page (viewport resize). Same teardown rules
    /// as navigation.
    pub fn resize(&mut self, render_size: RenderSize) {
        self.open_page(self.page, render_size);
    }

    fn editing_locked(&self) -> bool {
        self.document.is_finalized
    }

    /// Topmost annotation under the pointer, if any
    fn hit_test(&self, x: f64, y: f64) -> Option<&Annotation> {
        self.store
            .for_page(self.page)
            .filter(|a| a.rect.contains(x, y))
            .last()
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> Vec<Notice> {
        if self.editing_locked() {
            return vec![Notice::EditingDisabled];
        }
        match self.mode {
            Mode::View => {
                if let Some(hit) = self.hit_test(x, y) {
                    self.transient = Transient::Dragging {
                        id: hit.id.clone(),
                        grab_dx: x - hit.rect.x,
                        grab_dy: y - hit.rect.y,
                    };
                }
                Vec::new()
            }
            Mode::SignatureField => {
                if self.hit_test(x, y).is_some() {
                    return Vec::new();
                }
                self.transient = Transient::DrawingField {
                    origin: (x, y),
                    rect: OverlayRect::new(x, y, 0.0, 0.0),
                };
                Vec::new()
            }
            Mode::PlaceSignature => self.place_signature(x, y),
            Mode::TextField => Vec::new(),
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> Vec<Notice> {
        if self.editing_locked() {
            return Vec::new();
        }
        match &mut self.transient {
            Transient::Dragging { id, grab_dx, grab_dy } => {
                let (id, nx, ny) = (id.clone(), x - *grab_dx, y - *grab_dy);
                self.store.update(&id, |a| {
                    a.rect.x = nx;
                    a.rect.y = ny;
                });
                // Coalesced; the save lands at pointer-up
                self.store.queue_save();
            }
            Transient::DrawingField { origin, rect } => {
                rect.x = origin.0.min(x);
                rect.y = origin.1.min(y);
                rect.width = (x - origin.0).abs();
                rect.height = (y - origin.1).abs();
            }
            Transient::Idle => {}
        }
        Vec::new()
    }

    pub fn pointer_up(&mut self) -> Vec<Notice> {
        let transient = std::mem::replace(&mut self.transient, Transient::Idle);
        if self.editing_locked() {
            return Vec::new();
        }
        match transient {
            Transient::Dragging { .. } => {
                self.store.flush();
                Vec::new()
            }
            Transient::DrawingField { rect, .. } => {
                if rect.width > MIN_FIELD_SIZE && rect.height > MIN_FIELD_SIZE {
                    let annotation = Annotation::new(
                        self.document.id.clone(),
                        self.page,
                        rect,
                        self.render_size,
                        AnnotationPayload::SignatureField,
                    );
                    self.store.insert(annotation);
                    self.store.flush();
                    vec![Notice::FieldAdded]
                } else {
                    // Discarded outright, so no save is issued
                    vec![Notice::FieldTooSmall]
                }
            }
            Transient::Idle => Vec::new(),
        }
    }

    fn place_signature(&mut self, x: f64, y: f64) -> Vec<Notice> {
        if self.hit_test(x, y).is_some() {
            return Vec::new();
        }
        let Some(signature) = &self.signature else {
            // Unreachable through set_mode; guards direct misuse
            warn!("place gesture with no signature loaded");
            return Vec::new();
        };
        let rect = OverlayRect::new(
            x - SIGNATURE_WIDTH / 2.0,
            y - SIGNATURE_HEIGHT / 2.0,
            SIGNATURE_WIDTH,
            SIGNATURE_HEIGHT,
        );
        let annotation = Annotation::new(
            self.document.id.clone(),
            self.page,
            rect,
            self.render_size,
            AnnotationPayload::PlacedSignature {
                image_data: signature.data_url.clone(),
            },
        );
        self.store.insert(annotation);
        self.store.flush();
        vec![Notice::SignaturePlaced]
    }

    /// Double-click creates a text annotation in `TextField` mode; in other
    /// modes it is a no-op (editing an existing text object is signalled
    /// through [`commit_text`](Self::commit_text)).
    pub fn double_click(&mut self, x: f64, y: f64) -> Vec<Notice> {
        if self.editing_locked() {
            return vec![Notice::EditingDisabled];
        }
        if self.mode != Mode::TextField || self.hit_test(x, y).is_some() {
            return Vec::new();
        }
        let (width, height) = approx_text_extent(DEFAULT_TEXT, DEFAULT_FONT_SIZE);
        let annotation = Annotation::new(
            self.document.id.clone(),
            self.page,
            OverlayRect::new(x, y, width, height),
            self.render_size,
            AnnotationPayload::TextField {
                text: DEFAULT_TEXT.to_string(),
                font_size: DEFAULT_FONT_SIZE,
            },
        );
        self.store.insert(annotation);
        self.store.flush();
        vec![Notice::TextFieldAdded]
    }

    /// Commit edited text for a text annotation (blur or equivalent "done
    /// editing" signal). Applies only to a text annotation matched by id
    /// and the current page; the box is re-measured from the new content.
    pub fn commit_text(&mut self, id: &str, text: &str, font_size: f64) -> bool {
        if self.editing_locked() {
            return false;
        }
        // Checked before the mutation so a non-match never dirties the store
        let page = self.page;
        let applies = self.store.get(id).is_some_and(|a| {
            a.page == page && matches!(a.payload, AnnotationPayload::TextField { .. })
        });
        if !applies {
            return false;
        }
        self.store.update(id, |a| {
            if let AnnotationPayload::TextField {
                text: stored,
                font_size: stored_size,
            } = &mut a.payload
            {
                *stored = text.to_string();
                *stored_size = font_size;
            }
            let (width, height) = approx_text_extent(text, font_size);
            a.rect.width = width;
            a.rect.height = height;
        });
        self.store.flush();
        true
    }

    /// Apply an externally driven move/resize (drag handles) to an
    /// annotation matched by id and the current page, then save.
    pub fn apply_modification(&mut self, id: &str, rect: OverlayRect) -> bool {
        if self.editing_locked() {
            return false;
        }
        let page = self.page;
        if !self.store.get(id).is_some_and(|a| a.page == page) {
            return false;
        }
        self.store.update(id, |a| a.rect = rect);
        self.store.flush();
        true
    }

    pub fn delete_annotation(&mut self, id: &str) -> bool {
        if self.editing_locked() {
            return false;
        }
        let removed = self.store.remove(id);
        if removed {
            self.store.flush();
        }
        removed
    }

    /// Arm a finalize request. The pending annotation set is flushed first
    /// so the flattening side sees exactly what is on screen. A second call
    /// while one is outstanding is refused before reaching the remote side.
    pub fn begin_finalize(&mut self) -> Result<(), TransitionError> {
        if self.document.is_finalized {
            return Err(TransitionError::DocumentFinalized);
        }
        if self.finalize_in_flight {
            return Err(TransitionError::FinalizeInFlight);
        }
        self.store.flush();
        self.finalize_in_flight = true;
        Ok(())
    }

    pub fn finalize_in_flight(&self) -> bool {
        self.finalize_in_flight
    }

    /// Record the outcome of the finalize request armed by
    /// [`begin_finalize`](Self::begin_finalize). On success the document is
    /// locked, the mode forced to `View`, and the local working set dropped
    /// (the baked artifact supersedes the live objects). On failure the
    /// in-flight flag clears so the user may retry.
    pub fn complete_finalize(
        &mut self,
        outcome: Result<String, EndpointError>,
    ) -> Option<String> {
        self.finalize_in_flight = false;
        match outcome {
            Ok(artifact_id) => {
                self.document.is_finalized = true;
                self.mode = Mode::View;
                self.transient = Transient::Idle;
                self.store.clear_local();
                Some(artifact_id)
            }
            Err(err) => {
                warn!(document_id = %self.document.id, error = %err, "finalize failed");
                None
            }
        }
    }
}
