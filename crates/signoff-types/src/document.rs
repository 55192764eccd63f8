//! Document metadata visible to the overlay editor

use serde::{Deserialize, Serialize};

/// The slice of a document record the overlay editor needs: enough to bound
/// annotation pages and to enforce the finalized invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: String,
    pub page_count: u32,
    pub is_finalized: bool,
}

impl DocumentMeta {
    pub fn new(id: impl Into<String>, page_count: u32) -> Self {
        Self {
            id: id.into(),
            page_count,
            is_finalized: false,
        }
    }
}
