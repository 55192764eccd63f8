//! In-memory annotation set with whole-document persistence
//!
//! The store keeps the working set for one open document. Saves replace the
//! entire remote set for the document rather than merging, so the remote copy
//! always mirrors the last editor that wrote. Mutations mark the set dirty;
//! callers flush at gesture boundaries so a drag produces one save, not one
//! per pointer event.

use std::collections::VecDeque;

use signoff_types::Annotation;
use tracing::warn;

use crate::error::EndpointError;

/// Persistence backend for annotation sets.
///
/// `replace` swaps the complete set for a document and returns the set as
/// stored, which callers use to rehydrate after a save.
pub trait AnnotationEndpoint {
    fn fetch(&self, document_id: &str) -> Result<Vec<Annotation>, EndpointError>;

    fn replace(
        &self,
        document_id: &str,
        annotations: &[Annotation],
    ) -> Result<Vec<Annotation>, EndpointError>;
}

/// Outcome of one flushed save, drained by the caller for surfacing.
pub type SaveOutcome = Result<usize, EndpointError>;

pub struct AnnotationStore<E: AnnotationEndpoint> {
    endpoint: E,
    document_id: String,
    annotations: Vec<Annotation>,
    dirty: bool,
    save_outcomes: VecDeque<SaveOutcome>,
}

impl<E: AnnotationEndpoint> AnnotationStore<E> {
    /// Open the store for a document, replacing any previous working set
    /// with the endpoint's copy. A fetch failure leaves the set empty so the
    /// editor starts from a blank overlay instead of stale data.
    pub fn open(endpoint: E, document_id: impl Into<String>) -> Self {
        let document_id = document_id.into();
        let annotations = match endpoint.fetch(&document_id) {
            Ok(set) => set,
            Err(err) => {
                warn!(document_id = %document_id, error = %err, "annotation fetch failed, starting empty");
                Vec::new()
            }
        };
        Self {
            endpoint,
            document_id,
            annotations,
            dirty: false,
            save_outcomes: VecDeque::new(),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotations for one page, in insertion order (bottom to top)
    pub fn for_page(&self, page: u32) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.page == page)
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn insert(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
        self.dirty = true;
    }

    /// Apply a mutation to one annotation. Returns false if the id is
    /// unknown; any matching id marks the set dirty, so callers gate on
    /// their own preconditions before mutating.
    pub fn update(&mut self, id: &str, apply: impl FnOnce(&mut Annotation)) -> bool {
        match self.annotations.iter_mut().find(|a| a.id == id) {
            Some(annotation) => {
                apply(annotation);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.id != id);
        if self.annotations.len() < before {
            self.dirty = true;
            true
        } else {
            false
        }
    }

    /// Drop the local working set without saving. Used after finalize, when
    /// the remote set has already been cleared.
    pub fn clear_local(&mut self) {
        self.annotations.clear();
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the set dirty without saving. Intermediate gesture updates call
    /// this; the gesture end calls [`flush`](Self::flush).
    pub fn queue_save(&mut self) {
        self.dirty = true;
    }

    /// Save the whole set if dirty. Failures never mutate the local set; the
    /// outcome is queued for the caller to drain and surface.
    pub fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        match self.endpoint.replace(&self.document_id, &self.annotations) {
            Ok(stored) => {
                self.annotations = stored;
                self.dirty = false;
                self.save_outcomes.push_back(Ok(self.annotations.len()));
            }
            Err(err) => {
                warn!(document_id = %self.document_id, error = %err, "annotation save failed");
                self.save_outcomes.push_back(Err(err));
            }
        }
    }

    /// Drain queued save outcomes, oldest first
    pub fn take_save_outcomes(&mut self) -> Vec<SaveOutcome> {
        self.save_outcomes.drain(..).collect()
    }
}
